//! Contrat du magasin tabulaire distant et implémentation mémoire
//!
//! Le coeur ne consomme que ce contrat; le magasin réel (PostgreSQL) vit
//! dans `pepiniere-pg`. `MemoryStore` sert aux tests et aux maquettes.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::error::StoreError;
use crate::filters::{Direction, Predicate, QueryDescriptor};
use crate::types::Table;

/// Contrat de lecture/écriture du magasin.
///
/// Trois opérations suffisent au coeur: chercher des lignes selon un
/// descripteur, insérer une ligne, remplacer une ligne par identifiant.
/// Chaque échec est un [`StoreError`] typé; aucune nouvelle tentative
/// n'est faite ici.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Lignes correspondant au descripteur, dans son ordre de tri
    async fn fetch_rows(&self, query: &QueryDescriptor) -> Result<Vec<Value>, StoreError>;

    /// Insère une ligne; le magasin attribue l'identifiant et retourne la
    /// ligne complète
    async fn insert_row(&self, table: Table, row: Value) -> Result<Value, StoreError>;

    /// Remplace les champs d'une ligne existante, retourne la ligne à jour
    async fn update_row(&self, table: Table, id: i64, row: Value) -> Result<Value, StoreError>;
}

/// Magasin en mémoire: tables de lignes JSON sous mutex, identifiants
/// croissants par table. Évalue les descripteurs comme le ferait le
/// magasin réel.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Table, Vec<Value>>> {
        // Un mutex empoisonné n'arrive qu'après un panic dans un test
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn fetch_rows(&self, query: &QueryDescriptor) -> Result<Vec<Value>, StoreError> {
        let tables = self.lock();
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.predicates.iter().all(|p| matches(row, p)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            let ordering = compare_values(
                field_value(a, query.sort.field).unwrap_or(&Value::Null),
                field_value(b, query.sort.field).unwrap_or(&Value::Null),
            );
            match query.sort.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });
        Ok(rows)
    }

    async fn insert_row(&self, table: Table, row: Value) -> Result<Value, StoreError> {
        let mut object = match row {
            Value::Object(object) => object,
            other => {
                return Err(StoreError::Decode(format!(
                    "expected JSON object for insert, got {other}"
                )))
            }
        };

        let mut tables = self.lock();
        let rows = tables.entry(table).or_default();
        let next_id = rows
            .iter()
            .filter_map(|r| r.get(table.primary_key()).and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;
        object.insert(table.primary_key().to_string(), Value::from(next_id));

        let stored = Value::Object(object);
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn update_row(&self, table: Table, id: i64, row: Value) -> Result<Value, StoreError> {
        let object = match row {
            Value::Object(object) => object,
            other => {
                return Err(StoreError::Decode(format!(
                    "expected JSON object for update, got {other}"
                )))
            }
        };

        let mut tables = self.lock();
        let rows = tables.entry(table).or_default();
        let existing = rows
            .iter_mut()
            .find(|r| r.get(table.primary_key()).and_then(Value::as_i64) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                table: table.name().to_string(),
                id,
            })?;

        if let Some(target) = existing.as_object_mut() {
            for (key, value) in object {
                if key == table.primary_key() {
                    continue;
                }
                target.insert(key, value);
            }
        }
        Ok(existing.clone())
    }
}

/// Valeur d'un champ, avec descente dans les objets joints ("parcelle.nom")
fn field_value<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = row;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn matches(row: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::TextContains { fields, text } => {
            let needle = text.to_lowercase();
            fields.iter().any(|field| {
                field_value(row, field)
                    .and_then(Value::as_str)
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        }
        Predicate::Eq { field, value } => {
            field_value(row, field).and_then(Value::as_i64) == Some(*value)
        }
        Predicate::DateFrom { field, date } => date_value(row, field)
            .map(|d| d >= *date)
            .unwrap_or(false),
        Predicate::DateTo { field, date } => date_value(row, field)
            .map(|d| d <= *date)
            .unwrap_or(false),
    }
}

fn date_value(row: &Value, field: &str) -> Option<NaiveDate> {
    field_value(row, field)?
        .as_str()
        .and_then(|s| s.parse().ok())
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{ActivityFilter, Sort};
    use serde_json::json;

    fn descriptor(table: Table) -> QueryDescriptor {
        QueryDescriptor {
            table,
            predicates: Vec::new(),
            sort: Sort {
                field: "nom",
                direction: Direction::Asc,
            },
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store
            .insert_row(Table::Parcelle, json!({"nom": "Vallée", "code": "VAL-1"}))
            .await
            .unwrap();
        let b = store
            .insert_row(Table::Parcelle, json!({"nom": "Coteau", "code": "COT-1"}))
            .await
            .unwrap();
        assert_eq!(a["parcelle_id"], 1);
        assert_eq!(b["parcelle_id"], 2);
    }

    #[tokio::test]
    async fn test_fetch_sorts_ascending() {
        let store = MemoryStore::new();
        for nom in ["Vallée", "Coteau", "Plateau"] {
            store
                .insert_row(Table::Parcelle, json!({ "nom": nom }))
                .await
                .unwrap();
        }
        let rows = store.fetch_rows(&descriptor(Table::Parcelle)).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["nom"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Coteau", "Plateau", "Vallée"]);
    }

    #[tokio::test]
    async fn test_fetch_applies_conjunctive_predicates() {
        let store = MemoryStore::new();
        store
            .insert_row(
                Table::Activite,
                json!({"operateur": "Martin", "type_activite_id": 1, "date_activite": "2024-03-01"}),
            )
            .await
            .unwrap();
        store
            .insert_row(
                Table::Activite,
                json!({"operateur": "Martin", "type_activite_id": 2, "date_activite": "2023-03-01"}),
            )
            .await
            .unwrap();

        let filter = ActivityFilter {
            search: Some("mar".to_string()),
            type_activite_id: Some(1),
            date_from: Some("2024-01-01".parse().unwrap()),
            ..Default::default()
        };
        let rows = store.fetch_rows(&filter.compose()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["type_activite_id"], 1);
    }

    #[tokio::test]
    async fn test_fetch_sorts_dates_descending() {
        let store = MemoryStore::new();
        for date in ["2024-01-15", "2024-06-02", "2023-11-30"] {
            store
                .insert_row(Table::Activite, json!({ "date_activite": date, "operateur": "x" }))
                .await
                .unwrap();
        }
        let rows = store
            .fetch_rows(&ActivityFilter::default().compose())
            .await
            .unwrap();
        let dates: Vec<&str> = rows
            .iter()
            .map(|r| r["date_activite"].as_str().unwrap())
            .collect();
        assert_eq!(dates, vec!["2024-06-02", "2024-01-15", "2023-11-30"]);
    }

    #[tokio::test]
    async fn test_update_replaces_fields_keeps_id() {
        let store = MemoryStore::new();
        let row = store
            .insert_row(Table::Activite, json!({"operateur": "Martin", "zone_concernee": "Nord"}))
            .await
            .unwrap();
        let id = row["activite_id"].as_i64().unwrap();

        let updated = store
            .update_row(
                Table::Activite,
                id,
                json!({"operateur": "Durand", "activite_id": 999}),
            )
            .await
            .unwrap();
        assert_eq!(updated["activite_id"], id);
        assert_eq!(updated["operateur"], "Durand");
        // Champ non fourni conservé
        assert_eq!(updated["zone_concernee"], "Nord");
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_row(Table::Activite, 42, json!({"operateur": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 42, .. }));
    }
}
