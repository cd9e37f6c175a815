//! Types d'erreurs du coeur pépinière

use thiserror::Error;

/// Échec du magasin de données distant (réseau, requête, décodage).
///
/// Propagé tel quel à l'appelant: le coeur ne fait aucune nouvelle
/// tentative, la couche appelante est responsable du message utilisateur.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connexion au magasin impossible
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// La requête a été refusée ou a échoué côté magasin
    #[error("Query failed on table {table}: {reason}")]
    Query { table: String, reason: String },

    /// Ligne inexistante lors d'une mise à jour
    #[error("Row not found in {table}: id {id}")]
    NotFound { table: String, id: i64 },

    /// Ligne illisible (forme inattendue)
    #[error("Row decode failed: {0}")]
    Decode(String),
}

/// Raison d'un rejet de champ
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldReason {
    /// Champ requis absent ou vide
    #[error("required field is missing or empty")]
    Required,

    /// Valeur numérique sous le minimum autorisé
    #[error("value must be at least {minimum}")]
    Minimum { minimum: f64 },

    /// Valeur numérique hors de l'intervalle autorisé
    #[error("value must be between {minimum} and {maximum}")]
    Range { minimum: f64, maximum: f64 },

    /// Valeur ne respectant pas le motif attendu
    #[error("value does not match pattern {pattern}")]
    Pattern { pattern: &'static str },
}

/// Erreur de validation au niveau d'un champ.
///
/// Toujours corrigeable par l'utilisateur: la soumission peut être
/// réaffichée avec les erreurs attachées puis retentée. Jamais fatale.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    /// Nom du champ en saisie
    pub field: String,
    /// Raison du rejet
    pub reason: FieldReason,
}

impl FieldError {
    /// Champ requis manquant
    pub fn required(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: FieldReason::Required,
        }
    }
}

/// Échec d'une opération de session
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Erreurs de champ rapportées à l'utilisateur, soumission retentable
    #[error("invalid submission ({} field error(s))", .0.len())]
    Validation(Vec<FieldError>),

    /// Échec du magasin, propagé sans nouvelle tentative
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        let err = FieldError::required("operateur");
        assert_eq!(err.to_string(), "operateur: required field is missing or empty");

        let err = FieldError {
            field: "nbr_plants".to_string(),
            reason: FieldReason::Minimum { minimum: 1.0 },
        };
        assert_eq!(err.to_string(), "nbr_plants: value must be at least 1");
    }

    #[test]
    fn test_service_error_counts_fields() {
        let err = ServiceError::Validation(vec![
            FieldError::required("operateur"),
            FieldError::required("fournisseur"),
        ]);
        assert!(err.to_string().contains("2 field error(s)"));
    }
}
