//! Traduction des descripteurs en SQL paramétré
//!
//! Le coeur n'émet jamais de SQL: il compose un descripteur, traduit ici.
//! Les lignes traversent le contrat en JSON (`to_jsonb` en lecture,
//! `jsonb_populate_record` en écriture) — aucun mapping de colonnes à
//! maintenir.

use chrono::NaiveDate;

use pepiniere::filters::{Direction, Predicate, QueryDescriptor};
use pepiniere::types::Table;

/// Paramètre lié d'une requête
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParam {
    Text(String),
    Int(i64),
    Date(NaiveDate),
}

/// Requête SQL avec ses paramètres liés
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub text: String,
    pub params: Vec<BoundParam>,
}

/// Construit le SELECT d'un descripteur.
///
/// La recherche libre sur les activités joint la parcelle pour filtrer
/// sur son nom et son code; les autres prédicats restent sur la table
/// principale.
pub fn select_query(schema: &str, query: &QueryDescriptor) -> SqlQuery {
    let table = query.table.name();
    let needs_join = query.table == Table::Activite
        && query.predicates.iter().any(|p| match p {
            Predicate::TextContains { fields, .. } => {
                fields.iter().any(|f| f.starts_with("parcelle."))
            }
            _ => false,
        });

    let mut text = format!("SELECT to_jsonb(t.*) FROM {schema}.{table} t");
    if needs_join {
        text.push_str(&format!(
            " LEFT JOIN {schema}.parcelle p ON p.parcelle_id = t.parcelle_id"
        ));
    }

    let mut params = Vec::new();
    let mut clauses = Vec::new();
    for predicate in &query.predicates {
        match predicate {
            Predicate::TextContains {
                fields,
                text: needle,
            } => {
                params.push(BoundParam::Text(format!("%{}%", escape_like(needle))));
                let n = params.len();
                let alternatives: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} ILIKE ${n}", qualify(f)))
                    .collect();
                clauses.push(format!("({})", alternatives.join(" OR ")));
            }
            Predicate::Eq { field, value } => {
                params.push(BoundParam::Int(*value));
                clauses.push(format!("{} = ${}", qualify(field), params.len()));
            }
            Predicate::DateFrom { field, date } => {
                params.push(BoundParam::Date(*date));
                clauses.push(format!("{} >= ${}", qualify(field), params.len()));
            }
            Predicate::DateTo { field, date } => {
                params.push(BoundParam::Date(*date));
                clauses.push(format!("{} <= ${}", qualify(field), params.len()));
            }
        }
    }
    if !clauses.is_empty() {
        text.push_str(" WHERE ");
        text.push_str(&clauses.join(" AND "));
    }

    let direction = match query.sort.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    text.push_str(&format!(
        " ORDER BY {} {direction}",
        qualify(query.sort.field)
    ));

    SqlQuery { text, params }
}

/// Construit l'INSERT d'une ligne JSON: colonnes explicites pour laisser
/// le magasin attribuer la clé primaire, ligne retournée complète
pub fn insert_query(schema: &str, table: Table, columns: &[&str]) -> String {
    let table_name = table.name();
    let cols = columns.join(", ");
    format!(
        "INSERT INTO {schema}.{table_name} ({cols}) \
         SELECT {cols} FROM jsonb_populate_record(NULL::{schema}.{table_name}, $1) \
         RETURNING to_jsonb({table_name}.*)"
    )
}

/// Construit l'UPDATE par clé primaire: remplacement des colonnes
/// fournies, ligne à jour retournée
pub fn update_query(schema: &str, table: Table, columns: &[&str]) -> String {
    let table_name = table.name();
    let pk = table.primary_key();
    let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = r.{c}")).collect();
    format!(
        "UPDATE {schema}.{table_name} t SET {} \
         FROM jsonb_populate_record(NULL::{schema}.{table_name}, $1) r \
         WHERE t.{pk} = $2 RETURNING to_jsonb(t.*)",
        assignments.join(", ")
    )
}

/// Identifiant de colonne sûr: minuscules, chiffres, underscore.
/// Les clés des lignes viennent de l'assembleur, ceci est un garde-fou.
pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Qualifie un champ du descripteur: table principale `t`, parcelle
/// jointe `p`
fn qualify(field: &str) -> String {
    match field.strip_prefix("parcelle.") {
        Some(rest) => format!("p.{rest}"),
        None => format!("t.{field}"),
    }
}

/// Échappe les métacaractères LIKE de la saisie utilisateur
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pepiniere::filters::{ActivityFilter, ParcelFilter};

    #[test]
    fn test_select_without_criteria() {
        let sql = select_query("pepiniere", &ParcelFilter::default().compose());
        assert_eq!(
            sql.text,
            "SELECT to_jsonb(t.*) FROM pepiniere.parcelle t ORDER BY t.nom ASC"
        );
        assert!(sql.params.is_empty());
    }

    #[test]
    fn test_select_activities_with_search_joins_parcelle() {
        let filter = ActivityFilter {
            search: Some("Nord".to_string()),
            ..Default::default()
        };
        let sql = select_query("pepiniere", &filter.compose());
        assert!(sql.text.contains("LEFT JOIN pepiniere.parcelle p"));
        assert!(sql
            .text
            .contains("(t.operateur ILIKE $1 OR p.nom ILIKE $1 OR p.code ILIKE $1)"));
        assert!(sql.text.ends_with("ORDER BY t.date_activite DESC"));
        assert_eq!(sql.params, vec![BoundParam::Text("%Nord%".to_string())]);
    }

    #[test]
    fn test_select_without_search_does_not_join() {
        let filter = ActivityFilter {
            type_activite_id: Some(3),
            ..Default::default()
        };
        let sql = select_query("pepiniere", &filter.compose());
        assert!(!sql.text.contains("JOIN"));
        assert!(sql.text.contains("t.type_activite_id = $1"));
        assert_eq!(sql.params, vec![BoundParam::Int(3)]);
    }

    #[test]
    fn test_select_date_bounds_are_inclusive() {
        let filter = ActivityFilter {
            date_from: Some("2024-01-01".parse().unwrap()),
            date_to: Some("2024-12-31".parse().unwrap()),
            ..Default::default()
        };
        let sql = select_query("pepiniere", &filter.compose());
        assert!(sql.text.contains("t.date_activite >= $1"));
        assert!(sql.text.contains("t.date_activite <= $2"));
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn test_like_metacharacters_are_escaped() {
        let filter = ParcelFilter {
            search: Some("50%_A".to_string()),
        };
        let sql = select_query("pepiniere", &filter.compose());
        assert_eq!(
            sql.params,
            vec![BoundParam::Text("%50\\%\\_A%".to_string())]
        );
    }

    #[test]
    fn test_insert_query_shape() {
        let sql = insert_query("pepiniere", Table::Activite, &["operateur", "parcelle_id"]);
        assert_eq!(
            sql,
            "INSERT INTO pepiniere.activite (operateur, parcelle_id) \
             SELECT operateur, parcelle_id FROM jsonb_populate_record(NULL::pepiniere.activite, $1) \
             RETURNING to_jsonb(activite.*)"
        );
    }

    #[test]
    fn test_update_query_shape() {
        let sql = update_query("pepiniere", Table::Parcelle, &["nom", "surface_m2"]);
        assert!(sql.starts_with("UPDATE pepiniere.parcelle t SET nom = r.nom, surface_m2 = r.surface_m2"));
        assert!(sql.contains("WHERE t.parcelle_id = $2"));
        assert!(sql.ends_with("RETURNING to_jsonb(t.*)"));
    }

    #[test]
    fn test_safe_identifiers() {
        assert!(is_safe_identifier("date_activite"));
        assert!(is_safe_identifier("surface_m2"));
        assert!(!is_safe_identifier("Nom"));
        assert!(!is_safe_identifier("nom; DROP TABLE"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("2nom"));
    }
}
