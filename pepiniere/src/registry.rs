//! Catalogue des types d'activités
//!
//! Donnée de référence de portée session: chargée en une seule requête au
//! démarrage, injectée dans les composants qui en ont besoin, puis en
//! lecture seule — les lectures concurrentes sans synchronisation sont
//! sûres puisqu'il n'y a plus aucune mutation après chargement.

use std::collections::HashMap;

use tracing::warn;

use crate::filters;
use crate::store::Datastore;
use crate::types::{TypeActivite, TypeCode};

/// Catalogue des types d'activités avec résolution id → code
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<TypeActivite>,
    by_id: HashMap<i64, usize>,
    loaded: bool,
}

impl TypeRegistry {
    /// Registre vide: toute résolution donne `Unknown`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Charge le catalogue complet depuis le magasin.
    ///
    /// En cas d'échec, retourne un registre vide après un avertissement:
    /// les appelants rendent alors aucune zone spécifique au type et
    /// persistent une charge utile vide, au lieu d'interrompre la session.
    pub async fn load(store: &dyn Datastore) -> Self {
        match store.fetch_rows(&filters::type_catalog()).await {
            Ok(rows) => {
                let mut types = Vec::with_capacity(rows.len());
                for row in rows {
                    match serde_json::from_value::<TypeActivite>(row) {
                        Ok(t) => types.push(t),
                        Err(e) => warn!("Ligne du catalogue illisible, ignorée: {e}"),
                    }
                }
                Self::from_types(types)
            }
            Err(e) => {
                warn!("Chargement du catalogue impossible, registre vide: {e}");
                Self::empty()
            }
        }
    }

    /// Construit le registre depuis des types déjà chargés.
    ///
    /// Les identifiants et codes sont uniques dans le catalogue; un
    /// doublon est signalé et la première occurrence conservée.
    pub fn from_types(types: Vec<TypeActivite>) -> Self {
        let mut kept: Vec<TypeActivite> = Vec::with_capacity(types.len());
        let mut by_id = HashMap::with_capacity(types.len());
        let mut codes: HashMap<String, i64> = HashMap::with_capacity(types.len());

        for t in types {
            if by_id.contains_key(&t.type_activite_id) {
                warn!(
                    id = t.type_activite_id,
                    "Identifiant de type en double dans le catalogue, ignoré"
                );
                continue;
            }
            if let Some(first) = codes.get(&t.code) {
                warn!(
                    code = t.code.as_str(),
                    premier = *first,
                    "Code de type en double dans le catalogue, ignoré"
                );
                continue;
            }
            by_id.insert(t.type_activite_id, kept.len());
            codes.insert(t.code.clone(), t.type_activite_id);
            kept.push(t);
        }

        Self {
            types: kept,
            by_id,
            loaded: true,
        }
    }

    /// Vrai une fois le chargement effectué (même s'il a échoué et que le
    /// registre est resté vide, la session est considérée initialisée)
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Catalogue complet, dans l'ordre de chargement (libellé croissant)
    pub fn types(&self) -> &[TypeActivite] {
        &self.types
    }

    /// Type du catalogue pour un identifiant
    pub fn type_for(&self, type_activite_id: i64) -> Option<&TypeActivite> {
        self.by_id
            .get(&type_activite_id)
            .map(|&index| &self.types[index])
    }

    /// Type du catalogue pour un code texte
    pub fn type_by_code(&self, code: &str) -> Option<&TypeActivite> {
        self.types.iter().find(|t| t.code == code)
    }

    /// Code stable d'un type; `Unknown` si l'identifiant est absent du
    /// catalogue (registre vide compris)
    pub fn resolve_code(&self, type_activite_id: i64) -> TypeCode {
        self.type_for(type_activite_id)
            .map(TypeActivite::type_code)
            .unwrap_or(TypeCode::Unknown)
    }
}
