//! Opérations de session au-dessus du magasin
//!
//! Façade unique consommée par les couches d'interface: création et
//! remplacement d'enregistrements, listages filtrés avec écartement des
//! réponses périmées. Dans une soumission, normalisation et assemblage
//! précèdent de façon synchrone l'unique appel de persistance — aucune
//! écriture partielle n'est possible à ce niveau.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::assembler::{
    activity_view, assemble_activity, assemble_parcel, assemble_species_link, ActivityInput,
    ActivityView, ParcelInput, SpeciesLinkInput,
};
use crate::error::{ServiceError, StoreError};
use crate::fetch::FetchSequence;
use crate::filters::{self, ActivityFilter, ParcelFilter};
use crate::registry::TypeRegistry;
use crate::store::Datastore;
use crate::types::{Activite, Parcelle, ParcelleEspece, Table};

/// Façade des opérations de terrain
pub struct Service {
    store: Arc<dyn Datastore>,
    registry: Arc<TypeRegistry>,
    activity_fetches: FetchSequence,
    parcel_fetches: FetchSequence,
}

impl Service {
    /// Ouvre une session: charge le catalogue des types puis construit la
    /// façade. Un échec de chargement donne un registre vide, la session
    /// reste utilisable.
    pub async fn open(store: Arc<dyn Datastore>) -> Self {
        let registry = Arc::new(TypeRegistry::load(store.as_ref()).await);
        Self::with_registry(store, registry)
    }

    /// Construit la façade avec un registre déjà chargé
    pub fn with_registry(store: Arc<dyn Datastore>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            store,
            registry,
            activity_fetches: FetchSequence::new(),
            parcel_fetches: FetchSequence::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Crée une activité. L'écriture n'est tentée qu'en l'absence
    /// d'erreur de champ; sinon les erreurs sont retournées pour
    /// réaffichage et la soumission peut être retentée.
    pub async fn create_activity(
        &self,
        input: &ActivityInput,
    ) -> Result<ActivityView, ServiceError> {
        let assembled = assemble_activity(&self.registry, input);
        if !assembled.is_valid() {
            return Err(ServiceError::Validation(assembled.errors));
        }
        let row = self.store.insert_row(Table::Activite, assembled.row).await?;
        Ok(activity_view(&self.registry, decode::<Activite>(row)?))
    }

    /// Remplace intégralement une activité existante (pas de rustine
    /// partielle: la ligne est réassemblée depuis la saisie complète)
    pub async fn update_activity(
        &self,
        activite_id: i64,
        input: &ActivityInput,
    ) -> Result<ActivityView, ServiceError> {
        let assembled = assemble_activity(&self.registry, input);
        if !assembled.is_valid() {
            return Err(ServiceError::Validation(assembled.errors));
        }
        let row = self
            .store
            .update_row(Table::Activite, activite_id, assembled.row)
            .await?;
        Ok(activity_view(&self.registry, decode::<Activite>(row)?))
    }

    /// Liste les activités selon le filtre, types résolus attachés.
    ///
    /// Retourne `None` si un autre listage a été lancé entre-temps: la
    /// réponse périmée est écartée au lieu d'écraser la plus récente.
    pub async fn list_activities(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Option<Vec<ActivityView>>, ServiceError> {
        let token = self.activity_fetches.issue();
        let rows = self.store.fetch_rows(&filter.compose()).await?;
        if !self.activity_fetches.is_current(token) {
            debug!("Réponse de listage périmée écartée (filtre remplacé)");
            return Ok(None);
        }

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(activity_view(&self.registry, decode::<Activite>(row)?));
        }
        Ok(Some(views))
    }

    /// Crée une parcelle
    pub async fn create_parcel(&self, input: &ParcelInput) -> Result<Parcelle, ServiceError> {
        let assembled = assemble_parcel(input);
        if !assembled.is_valid() {
            return Err(ServiceError::Validation(assembled.errors));
        }
        let row = self.store.insert_row(Table::Parcelle, assembled.row).await?;
        decode(row)
    }

    /// Remplace intégralement une parcelle existante
    pub async fn update_parcel(
        &self,
        parcelle_id: i64,
        input: &ParcelInput,
    ) -> Result<Parcelle, ServiceError> {
        let assembled = assemble_parcel(input);
        if !assembled.is_valid() {
            return Err(ServiceError::Validation(assembled.errors));
        }
        let row = self
            .store
            .update_row(Table::Parcelle, parcelle_id, assembled.row)
            .await?;
        decode(row)
    }

    /// Liste les parcelles selon le filtre; `None` si la réponse est
    /// périmée
    pub async fn list_parcels(
        &self,
        filter: &ParcelFilter,
    ) -> Result<Option<Vec<Parcelle>>, ServiceError> {
        let token = self.parcel_fetches.issue();
        let rows = self.store.fetch_rows(&filter.compose()).await?;
        if !self.parcel_fetches.is_current(token) {
            debug!("Réponse de listage périmée écartée (filtre remplacé)");
            return Ok(None);
        }

        let mut parcels = Vec::with_capacity(rows.len());
        for row in rows {
            parcels.push(decode(row)?);
        }
        Ok(Some(parcels))
    }

    /// Lie une espèce plantée à une parcelle, indépendamment de la
    /// parcelle elle-même
    pub async fn link_species(
        &self,
        input: &SpeciesLinkInput,
    ) -> Result<ParcelleEspece, ServiceError> {
        let assembled = assemble_species_link(input);
        if !assembled.errors.is_empty() {
            return Err(ServiceError::Validation(assembled.errors));
        }
        let row = self
            .store
            .insert_row(Table::ParcelleEspece, assembled.row)
            .await?;
        decode(row)
    }

    /// Espèces plantées sur une parcelle
    pub async fn species_of(&self, parcelle_id: i64) -> Result<Vec<ParcelleEspece>, ServiceError> {
        let rows = self
            .store
            .fetch_rows(&filters::species_of(parcelle_id))
            .await?;
        rows.into_iter().map(decode).collect()
    }
}

fn decode<T: DeserializeOwned>(row: Value) -> Result<T, ServiceError> {
    serde_json::from_value(row)
        .map_err(|e| ServiceError::Store(StoreError::Decode(e.to_string())))
}
