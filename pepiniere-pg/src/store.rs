//! Magasin PostgreSQL: implémentation du contrat du coeur

use async_trait::async_trait;
use deadpool_postgres::Pool;
use serde_json::Value;
use tokio_postgres::types::ToSql;
use tracing::debug;

use pepiniere::error::StoreError;
use pepiniere::filters::QueryDescriptor;
use pepiniere::store::Datastore;
use pepiniere::types::Table;

use crate::sql::{self, BoundParam, SqlQuery};

/// Magasin adossé à PostgreSQL via un pool de connexions
pub struct PgStore {
    pool: Pool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: Pool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    async fn client(&self) -> Result<deadpool_postgres::Object, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn fetch_rows(&self, query: &QueryDescriptor) -> Result<Vec<Value>, StoreError> {
        let SqlQuery { text, params } = sql::select_query(&self.schema, query);
        debug!(sql = text.as_str(), "fetch_rows");

        let client = self.client().await?;
        let rows = client
            .query(&text, &bind(&params))
            .await
            .map_err(|e| query_error(query.table, e))?;
        Ok(rows.iter().map(|row| row.get::<_, Value>(0)).collect())
    }

    async fn insert_row(&self, table: Table, row: Value) -> Result<Value, StoreError> {
        let columns = writable_columns(table, &row)?;
        let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();
        let text = sql::insert_query(&self.schema, table, &column_refs);
        debug!(sql = text.as_str(), "insert_row");

        let client = self.client().await?;
        let inserted = client
            .query_one(&text, &[&row])
            .await
            .map_err(|e| query_error(table, e))?;
        Ok(inserted.get(0))
    }

    async fn update_row(&self, table: Table, id: i64, row: Value) -> Result<Value, StoreError> {
        let columns = writable_columns(table, &row)?;
        let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();
        let text = sql::update_query(&self.schema, table, &column_refs);
        debug!(sql = text.as_str(), id, "update_row");

        let client = self.client().await?;
        let updated = client
            .query_opt(&text, &[&row, &id])
            .await
            .map_err(|e| query_error(table, e))?;
        updated
            .map(|r| r.get(0))
            .ok_or_else(|| StoreError::NotFound {
                table: table.name().to_string(),
                id,
            })
    }
}

/// Colonnes à écrire: les clés de l'objet, clé primaire exclue (attribuée
/// par la base), noms vérifiés avant interpolation
fn writable_columns(table: Table, row: &Value) -> Result<Vec<String>, StoreError> {
    let object = row
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected JSON object for {}", table.name())))?;

    let mut columns = Vec::with_capacity(object.len());
    for key in object.keys() {
        if key == table.primary_key() {
            continue;
        }
        if !sql::is_safe_identifier(key) {
            return Err(StoreError::Decode(format!("unexpected column name: {key}")));
        }
        columns.push(key.clone());
    }
    if columns.is_empty() {
        return Err(StoreError::Decode(format!(
            "no writable column for {}",
            table.name()
        )));
    }
    Ok(columns)
}

fn query_error(table: Table, error: tokio_postgres::Error) -> StoreError {
    StoreError::Query {
        table: table.name().to_string(),
        reason: error.to_string(),
    }
}

fn bind(params: &[BoundParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| match p {
            BoundParam::Text(v) => v as &(dyn ToSql + Sync),
            BoundParam::Int(v) => v as &(dyn ToSql + Sync),
            BoundParam::Date(v) => v as &(dyn ToSql + Sync),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_writable_columns_skip_primary_key() {
        let row = json!({"activite_id": 4, "operateur": "Martin", "parcelle_id": 1});
        let columns = writable_columns(Table::Activite, &row).unwrap();
        assert_eq!(columns, vec!["operateur", "parcelle_id"]);
    }

    #[test]
    fn test_writable_columns_reject_unsafe_name() {
        let row = json!({"operateur; --": "x"});
        assert!(writable_columns(Table::Activite, &row).is_err());
    }

    #[test]
    fn test_writable_columns_reject_non_object() {
        assert!(writable_columns(Table::Activite, &json!([1, 2])).is_err());
    }
}
