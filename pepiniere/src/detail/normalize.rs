//! Normalisation des saisies brutes vers la charge utile canonique
//!
//! Politique de tolérance numérique: un nombre illisible est remplacé par
//! la valeur par défaut du champ (0) au lieu de bloquer la soumission.
//! C'est un choix assumé, couvert par les tests — ne pas le "corriger" en
//! validation stricte sans décision produit.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::schema::{schema_for, FieldKind, FieldSpec};
use super::ActiviteDetails;
use crate::error::{FieldError, FieldReason};
use crate::types::TypeCode;

/// Résultat d'une normalisation: charge utile best-effort et erreurs de
/// champ à réafficher. La charge utile est toujours complète, même en
/// présence d'erreurs, pour que le formulaire puisse être représenté.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub details: ActiviteDetails,
    pub errors: Vec<FieldError>,
}

impl Normalized {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Normalise des saisies brutes selon le schéma du code résolu.
///
/// Totale: ne lève jamais pour un code reconnu; un code inconnu donne la
/// charge utile vide sans erreur. Chaque champ déclaré par le schéma est
/// présent dans la sortie — ni clé en plus, ni clé manquante.
pub fn normalize(code: TypeCode, raw: &HashMap<String, String>) -> Normalized {
    let schema = schema_for(code);
    if schema.is_empty() {
        return Normalized {
            details: ActiviteDetails::Empty,
            errors: Vec::new(),
        };
    }

    let mut object = Map::new();
    let mut errors = Vec::new();

    for spec in schema {
        let input = raw.get(spec.name).map(|s| s.trim()).unwrap_or("");
        let missing = input.is_empty();
        if spec.required && missing {
            errors.push(FieldError::required(spec.name));
        }

        let value = match spec.kind {
            FieldKind::Text => Value::String(input.to_string()),
            FieldKind::Integer => {
                let n = parse_integer(input);
                if !missing {
                    check_minimum(spec, n as f64, &mut errors);
                }
                Value::from(n)
            }
            FieldKind::Float => {
                let x = parse_float(input);
                if !missing {
                    check_minimum(spec, x, &mut errors);
                }
                Value::from(x)
            }
        };
        object.insert(spec.name.to_string(), value);
    }

    Normalized {
        details: ActiviteDetails::from_stored(code, &Value::Object(object)),
        errors,
    }
}

fn check_minimum(spec: &FieldSpec, value: f64, errors: &mut Vec<FieldError>) {
    if let Some(minimum) = spec.minimum {
        if value < minimum {
            errors.push(FieldError {
                field: spec.name.to_string(),
                reason: FieldReason::Minimum { minimum },
            });
        }
    }
}

/// Lit un entier en tolérant une écriture décimale ("12.0" → 12);
/// 0 si illisible
fn parse_integer(raw: &str) -> i64 {
    let v = raw.trim();
    if v.is_empty() {
        return 0;
    }
    v.parse::<i64>()
        .or_else(|_| v.parse::<f64>().map(|x| x.trunc() as i64))
        .unwrap_or(0)
}

/// Lit un réel; 0 si illisible
fn parse_float(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::PlantationDetails;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_plantation_types_inputs() {
        let result = normalize(
            TypeCode::Plantation,
            &raw(&[
                ("fournisseur", "Acme"),
                ("nbr_plants", "50"),
                ("variete", "Epicea"),
                ("prix_unitaire", "1.5"),
            ]),
        );
        assert!(result.is_valid());
        assert_eq!(
            result.details,
            ActiviteDetails::Plantation(PlantationDetails {
                fournisseur: "Acme".to_string(),
                nbr_plants: 50,
                variete: "Epicea".to_string(),
                prix_unitaire: 1.5,
                zone_precise: String::new(),
            })
        );
    }

    #[test]
    fn test_normalize_output_matches_schema_exactly() {
        // Les clés hors schéma sont ignorées, chaque champ du schéma est
        // présent dans la sortie.
        let result = normalize(
            TypeCode::Irrigation,
            &raw(&[
                ("type_irrigation", "goutte à goutte"),
                ("duree_minutes", "45"),
                ("intrus", "ignoré"),
            ]),
        );
        let json = serde_json::to_value(&result.details).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["duree_minutes", "frequence_semaine", "type_irrigation"]);
    }

    #[test]
    fn test_unparsable_float_defaults_to_zero() {
        let result = normalize(
            TypeCode::Fertilisation,
            &raw(&[
                ("type_engrais", "NPK"),
                ("dose_kg_ha", "abc"),
                ("quantite_totale_kg", "120"),
            ]),
        );
        match &result.details {
            ActiviteDetails::Fertilisation(d) => {
                assert_eq!(d.dose_kg_ha, 0.0);
                assert_eq!(d.quantite_totale_kg, 120.0);
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_reports_error_keeps_payload() {
        let result = normalize(TypeCode::Observation, &raw(&[]));
        assert_eq!(result.errors, vec![FieldError::required("texte_observation")]);
        // Charge utile best-effort pour réaffichage
        let json = serde_json::to_value(&result.details).unwrap();
        assert_eq!(json["texte_observation"], "");
        assert_eq!(json["photo_url"], "");
    }

    #[test]
    fn test_below_minimum_reports_error() {
        let result = normalize(
            TypeCode::Recolte,
            &raw(&[
                ("nbr_arbres", "0"),
                ("taille_moy_cm", "80"),
                ("destination", "Vente"),
                ("qualite", "A"),
            ]),
        );
        assert_eq!(
            result.errors,
            vec![FieldError {
                field: "nbr_arbres".to_string(),
                reason: FieldReason::Minimum { minimum: 1.0 },
            }]
        );
        // La valeur saisie est conservée telle quelle
        match &result.details {
            ActiviteDetails::Recolte(d) => assert_eq!(d.nbr_arbres, 0),
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_optional_numeric_absent_takes_default() {
        let result = normalize(
            TypeCode::Desherbage,
            &raw(&[("methode", "mécanique")]),
        );
        assert!(result.is_valid());
        match &result.details {
            ActiviteDetails::Desherbage(d) => {
                assert_eq!(d.frequence_mois, 0);
                assert_eq!(d.operateur_detail, "");
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code_is_empty_without_error() {
        let result = normalize(TypeCode::Unknown, &raw(&[("fournisseur", "Acme")]));
        assert!(result.is_valid());
        assert_eq!(result.details, ActiviteDetails::Empty);
    }

    #[test]
    fn test_integer_tolerates_decimal_input() {
        let result = normalize(
            TypeCode::Irrigation,
            &raw(&[("type_irrigation", "aspersion"), ("duree_minutes", "45.7")]),
        );
        match &result.details {
            ActiviteDetails::Irrigation(d) => assert_eq!(d.duree_minutes, 45),
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_inputs_are_trimmed() {
        let result = normalize(
            TypeCode::Observation,
            &raw(&[("texte_observation", "  gel tardif  ")]),
        );
        match &result.details {
            ActiviteDetails::Observation(d) => assert_eq!(d.texte_observation, "gel tardif"),
            other => panic!("unexpected details: {other:?}"),
        }
    }
}
