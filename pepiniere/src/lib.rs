//! # pepiniere
//!
//! Coeur métier d'une gestion de pépinière forestière: parcelles à limite
//! polygonale géographique, journal d'activités de terrain à charge utile
//! polymorphe, composition de filtres et contrat de persistance.
//!
//! ## Features
//!
//! - Charge utile d'activité typée par code de catalogue (union fermée +
//!   variante inconnue), normalisée depuis la saisie brute avec tolérance
//!   numérique assumée
//! - Codec géométrique: ordre (lon, lat) au stockage, (lat, lon) à
//!   l'affichage, centre de cadrage, limite de remplacement
//! - Contrat [`store::Datastore`] consommé par le coeur; implémentation
//!   PostgreSQL dans `pepiniere-pg`, mémoire ici pour les tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pepiniere::{ActivityFilter, MemoryStore, Service};
//!
//! let store = Arc::new(MemoryStore::new());
//! let service = Service::open(store).await;
//!
//! let views = service.list_activities(&ActivityFilter::default()).await?;
//! for view in views.into_iter().flatten() {
//!     println!("{} — {:?}", view.activite.date_activite, view.details);
//! }
//! ```

pub mod assembler;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod filters;
pub mod geometry;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;

pub use assembler::{ActivityInput, ActivityView, ParcelInput, SpeciesLinkInput};
pub use detail::ActiviteDetails;
pub use error::{FieldError, FieldReason, ServiceError, StoreError};
pub use filters::{ActivityFilter, ParcelFilter, QueryDescriptor};
pub use geometry::Boundary;
pub use registry::TypeRegistry;
pub use service::Service;
pub use store::{Datastore, MemoryStore};
pub use types::{Activite, Espece, Parcelle, ParcelleEspece, Table, TypeActivite, TypeCode};
