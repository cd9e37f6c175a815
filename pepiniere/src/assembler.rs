//! Assemblage des enregistrements persistables et des modèles d'affichage
//!
//! Sens aller: saisie utilisateur → normalisation → ligne prête à écrire
//! (l'identifiant est attribué par le magasin à l'insertion). Sens retour:
//! ligne stockée + type résolu → modèle d'affichage.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{json, Value};

use crate::detail::normalize::{normalize, Normalized};
use crate::detail::ActiviteDetails;
use crate::error::{FieldError, FieldReason};
use crate::geometry::Boundary;
use crate::registry::TypeRegistry;
use crate::types::{Activite, Exposition, TypeActivite, TypeCode, TypeSol};

/// Motif autorisé pour le code d'une parcelle: majuscules, chiffres,
/// tirets uniquement
const PARCEL_CODE_PATTERN: &str = "^[A-Z0-9-]+$";

fn parcel_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PARCEL_CODE_PATTERN).expect("motif statique valide"))
}

/// Saisie d'une activité: champs communs plus champs de détail bruts tels
/// que soumis par le formulaire
#[derive(Debug, Clone)]
pub struct ActivityInput {
    pub parcelle_id: i64,
    pub type_activite_id: i64,
    pub date_activite: NaiveDate,
    pub operateur: String,
    pub commentaire_general: Option<String>,
    pub zone_concernee: Option<String>,
    /// Saisies brutes des champs spécifiques au type, nom → valeur
    pub detail_fields: HashMap<String, String>,
}

/// Activité assemblée: ligne prête à persister (sans identifiant), charge
/// utile canonique et erreurs de champ éventuelles pour réaffichage
#[derive(Debug, Clone)]
pub struct AssembledActivity {
    pub row: Value,
    pub details: ActiviteDetails,
    pub errors: Vec<FieldError>,
}

impl AssembledActivity {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Assemble une activité persistable depuis la saisie.
///
/// Normalisation et assemblage sont synchrones et best-effort: la ligne
/// est toujours complète, les erreurs de champ sont rapportées à côté.
/// L'écriture reste à la charge de l'appelant, en une seule requête.
pub fn assemble_activity(registry: &TypeRegistry, input: &ActivityInput) -> AssembledActivity {
    let mut errors = Vec::new();
    if input.operateur.trim().is_empty() {
        errors.push(FieldError::required("operateur"));
    }
    if input.parcelle_id <= 0 {
        errors.push(FieldError::required("parcelle_id"));
    }

    let code = registry.resolve_code(input.type_activite_id);
    let Normalized {
        details,
        errors: detail_errors,
    } = normalize(code, &input.detail_fields);
    errors.extend(detail_errors);

    let row = json!({
        "parcelle_id": input.parcelle_id,
        "type_activite_id": input.type_activite_id,
        "date_activite": input.date_activite,
        "operateur": input.operateur.trim(),
        "commentaire_general": input.commentaire_general,
        "zone_concernee": input.zone_concernee,
        "details": &details,
    });

    AssembledActivity {
        row,
        details,
        errors,
    }
}

/// Activité prête à afficher: ligne stockée, type résolu attaché, charge
/// utile décodée
#[derive(Debug, Clone)]
pub struct ActivityView {
    pub activite: Activite,
    /// Type du catalogue; `None` si l'identifiant n'y figure plus
    pub type_activite: Option<TypeActivite>,
    pub details: ActiviteDetails,
}

/// Attache le type résolu à une ligne stockée.
///
/// La charge utile traverse inchangée — elle est déjà canonique depuis la
/// normalisation d'origine; un code hérité ou inconnu donne la charge
/// utile vide.
pub fn activity_view(registry: &TypeRegistry, activite: Activite) -> ActivityView {
    let type_activite = registry.type_for(activite.type_activite_id).cloned();
    let code = type_activite
        .as_ref()
        .map(TypeActivite::type_code)
        .unwrap_or(TypeCode::Unknown);
    let details = ActiviteDetails::from_stored(code, &activite.details);
    ActivityView {
        activite,
        type_activite,
        details,
    }
}

/// Saisie d'une parcelle
#[derive(Debug, Clone)]
pub struct ParcelInput {
    pub code: String,
    pub nom: String,
    pub surface_m2: f64,
    pub type_sol: TypeSol,
    pub pente_deg: f64,
    pub exposition: Exposition,
    pub date_creation: NaiveDate,
    /// Limite dessinée sur la carte; peut être absente
    pub boundary: Boundary,
}

/// Parcelle assemblée, prête à persister
#[derive(Debug, Clone)]
pub struct AssembledParcel {
    pub row: Value,
    pub errors: Vec<FieldError>,
}

impl AssembledParcel {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Assemble une parcelle persistable: motif du code, bornes numériques,
/// limite déléguée au codec géométrique (carré de remplacement si absente)
pub fn assemble_parcel(input: &ParcelInput) -> AssembledParcel {
    let mut errors = Vec::new();

    let code = input.code.trim();
    if code.is_empty() {
        errors.push(FieldError::required("code"));
    } else if !parcel_code_regex().is_match(code) {
        errors.push(FieldError {
            field: "code".to_string(),
            reason: FieldReason::Pattern {
                pattern: PARCEL_CODE_PATTERN,
            },
        });
    }
    if input.nom.trim().is_empty() {
        errors.push(FieldError::required("nom"));
    }
    if input.surface_m2 < 0.0 {
        errors.push(FieldError {
            field: "surface_m2".to_string(),
            reason: FieldReason::Minimum { minimum: 0.0 },
        });
    }
    if !(0.0..=90.0).contains(&input.pente_deg) {
        errors.push(FieldError {
            field: "pente_deg".to_string(),
            reason: FieldReason::Range {
                minimum: 0.0,
                maximum: 90.0,
            },
        });
    }

    let row = json!({
        "code": code,
        "nom": input.nom.trim(),
        "surface_m2": input.surface_m2,
        "type_sol": input.type_sol,
        "pente_deg": input.pente_deg,
        "exposition": input.exposition,
        "date_creation": input.date_creation,
        "geom_coordonnee": input.boundary.or_placeholder(),
    });

    AssembledParcel { row, errors }
}

/// Saisie d'un lien espèce plantée sur une parcelle
#[derive(Debug, Clone)]
pub struct SpeciesLinkInput {
    pub parcelle_id: i64,
    pub espece_id: i64,
    pub quantite: i64,
    pub date_plantation: Option<NaiveDate>,
}

/// Lien espèce assemblé
#[derive(Debug, Clone)]
pub struct AssembledSpeciesLink {
    pub row: Value,
    pub errors: Vec<FieldError>,
}

/// Assemble un lien espèce persistable
pub fn assemble_species_link(input: &SpeciesLinkInput) -> AssembledSpeciesLink {
    let mut errors = Vec::new();
    if input.parcelle_id <= 0 {
        errors.push(FieldError::required("parcelle_id"));
    }
    if input.espece_id <= 0 {
        errors.push(FieldError::required("espece_id"));
    }
    if input.quantite < 0 {
        errors.push(FieldError {
            field: "quantite".to_string(),
            reason: FieldReason::Minimum { minimum: 0.0 },
        });
    }

    let row = json!({
        "parcelle_id": input.parcelle_id,
        "espece_id": input.espece_id,
        "quantite": input.quantite,
        "date_plantation": input.date_plantation,
    });

    AssembledSpeciesLink { row, errors }
}
