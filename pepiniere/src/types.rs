//! Types du domaine pépinière
//!
//! Les noms de champs suivent le schéma du magasin (français), les types
//! sont canoniques: dates calendaires, nombres typés, chaînes épurées.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::Boundary;

/// Tables du magasin tabulaire distant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Activite,
    Parcelle,
    TypeActivite,
    Espece,
    ParcelleEspece,
}

impl Table {
    /// Nom de la table côté magasin
    pub fn name(&self) -> &'static str {
        match self {
            Table::Activite => "activite",
            Table::Parcelle => "parcelle",
            Table::TypeActivite => "type_activite",
            Table::Espece => "espece",
            Table::ParcelleEspece => "parcelle_espece",
        }
    }

    /// Colonne de clé primaire, attribuée par le magasin à l'insertion
    pub fn primary_key(&self) -> &'static str {
        match self {
            Table::Activite => "activite_id",
            Table::Parcelle => "parcelle_id",
            Table::TypeActivite => "type_activite_id",
            Table::Espece => "espece_id",
            Table::ParcelleEspece => "parcelle_espece_id",
        }
    }
}

/// Code stable d'un type d'activité.
///
/// Union fermée sur les codes connus du catalogue, plus `Unknown` pour la
/// compatibilité ascendante avec un code non reconnu: la résolution d'un
/// code inconnu donne un schéma vide et une charge utile vide, jamais une
/// erreur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Plantation,
    Fertilisation,
    Phytosanitaire,
    Irrigation,
    Desherbage,
    Recolte,
    Observation,
    Unknown,
}

impl TypeCode {
    /// Résout un code texte du catalogue
    pub fn from_code(code: &str) -> Self {
        match code {
            "PLANTATION" => TypeCode::Plantation,
            "FERTILISATION" => TypeCode::Fertilisation,
            "PHYTOSANITAIRE" => TypeCode::Phytosanitaire,
            "IRRIGATION" => TypeCode::Irrigation,
            "DESHERBAGE" => TypeCode::Desherbage,
            "RECOLTE" => TypeCode::Recolte,
            "OBSERVATION" => TypeCode::Observation,
            _ => TypeCode::Unknown,
        }
    }

    /// Code texte du catalogue; `None` pour `Unknown`
    pub fn as_code(&self) -> Option<&'static str> {
        match self {
            TypeCode::Plantation => Some("PLANTATION"),
            TypeCode::Fertilisation => Some("FERTILISATION"),
            TypeCode::Phytosanitaire => Some("PHYTOSANITAIRE"),
            TypeCode::Irrigation => Some("IRRIGATION"),
            TypeCode::Desherbage => Some("DESHERBAGE"),
            TypeCode::Recolte => Some("RECOLTE"),
            TypeCode::Observation => Some("OBSERVATION"),
            TypeCode::Unknown => None,
        }
    }
}

/// Ligne du catalogue des types d'activités.
///
/// Immuable une fois créée; le catalogue est chargé une fois par session
/// puis traité en lecture seule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeActivite {
    pub type_activite_id: i64,
    pub code: String,
    pub libelle: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl TypeActivite {
    /// Code stable résolu depuis le texte du catalogue
    pub fn type_code(&self) -> TypeCode {
        TypeCode::from_code(&self.code)
    }
}

/// Type de sol d'une parcelle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSol {
    Argileux,
    Sableux,
    Limoneux,
    Calcaire,
    Humifere,
}

/// Exposition d'une parcelle (8 directions cardinales)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exposition {
    Nord,
    Sud,
    Est,
    Ouest,
    NordEst,
    NordOuest,
    SudEst,
    SudOuest,
}

/// Parcelle: parcelle de terrain avec attributs physiques et limite
/// géographique polygonale (anneau extérieur en ordre longitude, latitude)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcelle {
    pub parcelle_id: i64,
    pub code: String,
    pub nom: String,
    pub surface_m2: f64,
    pub type_sol: TypeSol,
    pub pente_deg: f64,
    pub exposition: Exposition,
    pub date_creation: NaiveDate,
    /// Limite stockée; une parcelle sans limite reste valide
    #[serde(default)]
    pub geom_coordonnee: Boundary,
}

/// Activité de terrain journalisée sur une parcelle.
///
/// La forme de `details` est entièrement déterminée par le code du type
/// résolu depuis `type_activite_id` — les deux ne divergent jamais.
/// Mutée uniquement par remplacement complet; jamais supprimée.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activite {
    pub activite_id: i64,
    pub parcelle_id: i64,
    pub type_activite_id: i64,
    pub date_activite: NaiveDate,
    pub operateur: String,
    #[serde(default)]
    pub commentaire_general: Option<String>,
    #[serde(default)]
    pub zone_concernee: Option<String>,
    /// Objet JSON persisté, décodé via [`crate::detail::ActiviteDetails`]
    /// une fois le type résolu
    #[serde(default)]
    pub details: Value,
}

/// Espèce de référence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Espece {
    pub espece_id: i64,
    pub nom: String,
    pub variete: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Lien plantation entre une parcelle et une espèce.
///
/// Créé indépendamment de la parcelle elle-même.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelleEspece {
    pub parcelle_espece_id: i64,
    pub parcelle_id: i64,
    pub espece_id: i64,
    pub quantite: i64,
    #[serde(default)]
    pub date_plantation: Option<NaiveDate>,
}
