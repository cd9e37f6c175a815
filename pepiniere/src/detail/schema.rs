//! Schémas de champs des charges utiles, par code d'activité
//!
//! Table statique pure: le formulaire appelant s'en sert pour le rendu des
//! champs spécifiques, le normaliseur pour la validation et le typage.

use crate::types::TypeCode;

/// Genre sémantique d'un champ de détail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Entier canonique (`i64`)
    Integer,
    /// Réel canonique (`f64`)
    Float,
    /// Chaîne épurée (trim)
    Text,
}

/// Spécification d'un champ d'une charge utile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Nom du champ, identique sur le fil
    pub name: &'static str,
    pub kind: FieldKind,
    /// Un champ requis absent ou vide est une erreur de champ
    pub required: bool,
    /// Borne inférieure incluse pour un champ numérique
    pub minimum: Option<f64>,
}

const fn text(name: &'static str, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
        required,
        minimum: None,
    }
}

const fn integer(name: &'static str, required: bool, minimum: f64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Integer,
        required,
        minimum: Some(minimum),
    }
}

const fn float(name: &'static str, required: bool, minimum: f64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Float,
        required,
        minimum: Some(minimum),
    }
}

const PLANTATION: &[FieldSpec] = &[
    text("fournisseur", true),
    integer("nbr_plants", true, 1.0),
    text("variete", true),
    float("prix_unitaire", false, 0.0),
    text("zone_precise", false),
];

const FERTILISATION: &[FieldSpec] = &[
    text("type_engrais", true),
    float("dose_kg_ha", true, 0.0),
    float("quantite_totale_kg", true, 0.0),
    text("commentaire_fertil", false),
];

const PHYTOSANITAIRE: &[FieldSpec] = &[
    text("produit_utilise", true),
    float("dosage_l_ha", true, 0.0),
    text("zone_ciblee", false),
    text("commentaire_phytosan", false),
];

const IRRIGATION: &[FieldSpec] = &[
    text("type_irrigation", true),
    integer("duree_minutes", true, 0.0),
    integer("frequence_semaine", false, 0.0),
];

const DESHERBAGE: &[FieldSpec] = &[
    text("methode", true),
    integer("frequence_mois", false, 0.0),
    text("operateur_detail", false),
];

const RECOLTE: &[FieldSpec] = &[
    integer("nbr_arbres", true, 1.0),
    integer("taille_moy_cm", true, 0.0),
    text("destination", true),
    text("qualite", true),
];

const OBSERVATION: &[FieldSpec] = &[text("texte_observation", true), text("photo_url", false)];

/// Schéma des champs d'un code d'activité.
///
/// Un code inconnu donne un schéma vide — pas une erreur — pour que le
/// formulaire appelant puisse légitimement sauter le rendu spécifique.
pub fn schema_for(code: TypeCode) -> &'static [FieldSpec] {
    match code {
        TypeCode::Plantation => PLANTATION,
        TypeCode::Fertilisation => FERTILISATION,
        TypeCode::Phytosanitaire => PHYTOSANITAIRE,
        TypeCode::Irrigation => IRRIGATION,
        TypeCode::Desherbage => DESHERBAGE,
        TypeCode::Recolte => RECOLTE,
        TypeCode::Observation => OBSERVATION,
        TypeCode::Unknown => &[],
    }
}
