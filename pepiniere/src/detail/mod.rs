//! Charge utile typée des activités
//!
//! Chaque type d'activité du catalogue porte son propre jeu de champs.
//! L'enregistrement persisté transporte un objet JSON dont la forme est
//! entièrement déterminée par le code du type résolu — jamais devinée
//! depuis l'objet lui-même.

pub mod normalize;
pub mod schema;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::types::TypeCode;

/// Détails d'une plantation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantationDetails {
    pub fournisseur: String,
    pub nbr_plants: i64,
    pub variete: String,
    pub prix_unitaire: f64,
    pub zone_precise: String,
}

/// Détails d'une fertilisation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FertilisationDetails {
    pub type_engrais: String,
    pub dose_kg_ha: f64,
    pub quantite_totale_kg: f64,
    pub commentaire_fertil: String,
}

/// Détails d'un traitement phytosanitaire
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhytosanitaireDetails {
    pub produit_utilise: String,
    pub dosage_l_ha: f64,
    pub zone_ciblee: String,
    pub commentaire_phytosan: String,
}

/// Détails d'une irrigation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrigationDetails {
    pub type_irrigation: String,
    pub duree_minutes: i64,
    pub frequence_semaine: i64,
}

/// Détails d'un désherbage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesherbageDetails {
    pub methode: String,
    pub frequence_mois: i64,
    pub operateur_detail: String,
}

/// Détails d'une récolte
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecolteDetails {
    pub nbr_arbres: i64,
    pub taille_moy_cm: i64,
    pub destination: String,
    pub qualite: String,
}

/// Détails d'une observation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationDetails {
    pub texte_observation: String,
    pub photo_url: String,
}

/// Charge utile d'une activité: une variante par code connu du catalogue,
/// plus `Empty` pour un code inconnu ou non renseigné (objet `{}`)
#[derive(Debug, Clone, PartialEq)]
pub enum ActiviteDetails {
    Plantation(PlantationDetails),
    Fertilisation(FertilisationDetails),
    Phytosanitaire(PhytosanitaireDetails),
    Irrigation(IrrigationDetails),
    Desherbage(DesherbageDetails),
    Recolte(RecolteDetails),
    Observation(ObservationDetails),
    Empty,
}

impl ActiviteDetails {
    /// Code du type correspondant à la variante
    pub fn type_code(&self) -> TypeCode {
        match self {
            ActiviteDetails::Plantation(_) => TypeCode::Plantation,
            ActiviteDetails::Fertilisation(_) => TypeCode::Fertilisation,
            ActiviteDetails::Phytosanitaire(_) => TypeCode::Phytosanitaire,
            ActiviteDetails::Irrigation(_) => TypeCode::Irrigation,
            ActiviteDetails::Desherbage(_) => TypeCode::Desherbage,
            ActiviteDetails::Recolte(_) => TypeCode::Recolte,
            ActiviteDetails::Observation(_) => TypeCode::Observation,
            ActiviteDetails::Empty => TypeCode::Unknown,
        }
    }

    /// Décode l'objet `details` persisté selon le code résolu.
    ///
    /// Le code fait autorité sur la forme. Les champs absents prennent
    /// leur valeur par défaut; un objet illisible est signalé puis traité
    /// comme absent.
    pub fn from_stored(code: TypeCode, value: &Value) -> ActiviteDetails {
        match code {
            TypeCode::Plantation => ActiviteDetails::Plantation(read_details(value)),
            TypeCode::Fertilisation => ActiviteDetails::Fertilisation(read_details(value)),
            TypeCode::Phytosanitaire => ActiviteDetails::Phytosanitaire(read_details(value)),
            TypeCode::Irrigation => ActiviteDetails::Irrigation(read_details(value)),
            TypeCode::Desherbage => ActiviteDetails::Desherbage(read_details(value)),
            TypeCode::Recolte => ActiviteDetails::Recolte(read_details(value)),
            TypeCode::Observation => ActiviteDetails::Observation(read_details(value)),
            TypeCode::Unknown => ActiviteDetails::Empty,
        }
    }
}

fn read_details<T: DeserializeOwned + Default>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        warn!("Objet details illisible, valeurs par défaut appliquées: {e}");
        T::default()
    })
}

impl Serialize for ActiviteDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Forme persistée: l'objet de la variante, sans étiquette — le code
        // est porté par type_activite_id sur l'enregistrement.
        match self {
            ActiviteDetails::Plantation(d) => d.serialize(serializer),
            ActiviteDetails::Fertilisation(d) => d.serialize(serializer),
            ActiviteDetails::Phytosanitaire(d) => d.serialize(serializer),
            ActiviteDetails::Irrigation(d) => d.serialize(serializer),
            ActiviteDetails::Desherbage(d) => d.serialize(serializer),
            ActiviteDetails::Recolte(d) => d.serialize(serializer),
            ActiviteDetails::Observation(d) => d.serialize(serializer),
            ActiviteDetails::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_stored_plantation() {
        let stored = json!({
            "fournisseur": "Acme",
            "nbr_plants": 50,
            "variete": "Epicea",
            "prix_unitaire": 1.5,
            "zone_precise": ""
        });
        let details = ActiviteDetails::from_stored(TypeCode::Plantation, &stored);
        assert_eq!(
            details,
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
    fn test_from_stored_missing_fields_default() {
        let details = ActiviteDetails::from_stored(TypeCode::Irrigation, &json!({}));
        assert_eq!(
            details,
            ActiviteDetails::Irrigation(IrrigationDetails::default())
        );
    }

    #[test]
    fn test_from_stored_unknown_code_is_empty() {
        let stored = json!({"fournisseur": "Acme"});
        assert_eq!(
            ActiviteDetails::from_stored(TypeCode::Unknown, &stored),
            ActiviteDetails::Empty
        );
    }

    #[test]
    fn test_empty_serializes_as_empty_object() {
        let json = serde_json::to_value(ActiviteDetails::Empty).unwrap();
        assert_eq!(json, json!({}));
    }

    #[test]
    fn test_variant_serializes_without_tag() {
        let details = ActiviteDetails::Observation(ObservationDetails {
            texte_observation: "Gel tardif sur les jeunes plants".to_string(),
            photo_url: String::new(),
        });
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(
            json,
            json!({"texte_observation": "Gel tardif sur les jeunes plants", "photo_url": ""})
        );
    }
}
