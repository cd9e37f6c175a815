//! Composition des critères utilisateur en descripteur de requête
//!
//! Le descripteur est indépendant du magasin: les prédicats sont traduits
//! en SQL par `pepiniere-pg`, évalués en mémoire par le magasin de test.
//! Le filtrage est conjonctif sur les seuls critères fournis.

use chrono::NaiveDate;

use crate::types::Table;

/// Champs parcourus par la recherche libre sur les activités: opérateur,
/// plus nom et code de la parcelle jointe
pub const ACTIVITY_SEARCH_FIELDS: &[&str] = &["operateur", "parcelle.nom", "parcelle.code"];

/// Champs parcourus par la recherche libre sur les parcelles
pub const PARCEL_SEARCH_FIELDS: &[&str] = &["nom", "code"];

/// Prédicat d'un descripteur
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Contient, insensible à la casse, sur au moins un des champs
    TextContains {
        fields: &'static [&'static str],
        text: String,
    },
    /// Égalité stricte sur un identifiant
    Eq { field: &'static str, value: i64 },
    /// Borne inférieure incluse sur une date
    DateFrom { field: &'static str, date: NaiveDate },
    /// Borne supérieure incluse sur une date
    DateTo { field: &'static str, date: NaiveDate },
}

/// Sens de tri
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Tri d'un descripteur — fixe par table, non configurable
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: &'static str,
    pub direction: Direction,
}

/// Descripteur de requête indépendant du magasin
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub table: Table,
    pub predicates: Vec<Predicate>,
    pub sort: Sort,
}

/// Critères utilisateur pour la liste des activités
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    /// Recherche libre (opérateur, nom/code de parcelle)
    pub search: Option<String>,
    pub type_activite_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ActivityFilter {
    /// Compose le descripteur: un prédicat par critère fourni, tri par
    /// date d'activité décroissante
    pub fn compose(&self) -> QueryDescriptor {
        let mut predicates = Vec::new();
        if let Some(text) = cleaned(&self.search) {
            predicates.push(Predicate::TextContains {
                fields: ACTIVITY_SEARCH_FIELDS,
                text,
            });
        }
        if let Some(id) = self.type_activite_id {
            predicates.push(Predicate::Eq {
                field: "type_activite_id",
                value: id,
            });
        }
        if let Some(date) = self.date_from {
            predicates.push(Predicate::DateFrom {
                field: "date_activite",
                date,
            });
        }
        if let Some(date) = self.date_to {
            predicates.push(Predicate::DateTo {
                field: "date_activite",
                date,
            });
        }
        QueryDescriptor {
            table: Table::Activite,
            predicates,
            sort: Sort {
                field: "date_activite",
                direction: Direction::Desc,
            },
        }
    }
}

/// Critères utilisateur pour la liste des parcelles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParcelFilter {
    pub search: Option<String>,
}

impl ParcelFilter {
    /// Compose le descripteur: tri par nom croissant
    pub fn compose(&self) -> QueryDescriptor {
        let mut predicates = Vec::new();
        if let Some(text) = cleaned(&self.search) {
            predicates.push(Predicate::TextContains {
                fields: PARCEL_SEARCH_FIELDS,
                text,
            });
        }
        QueryDescriptor {
            table: Table::Parcelle,
            predicates,
            sort: Sort {
                field: "nom",
                direction: Direction::Asc,
            },
        }
    }
}

/// Descripteur du catalogue complet des types, trié par libellé
pub fn type_catalog() -> QueryDescriptor {
    QueryDescriptor {
        table: Table::TypeActivite,
        predicates: Vec::new(),
        sort: Sort {
            field: "libelle",
            direction: Direction::Asc,
        },
    }
}

/// Descripteur des espèces plantées sur une parcelle
pub fn species_of(parcelle_id: i64) -> QueryDescriptor {
    QueryDescriptor {
        table: Table::ParcelleEspece,
        predicates: vec![Predicate::Eq {
            field: "parcelle_id",
            value: parcelle_id,
        }],
        sort: Sort {
            field: "parcelle_espece_id",
            direction: Direction::Asc,
        },
    }
}

fn cleaned(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
