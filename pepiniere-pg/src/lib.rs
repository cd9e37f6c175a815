//! # pepiniere-pg
//!
//! Magasin PostgreSQL et CLI pour le coeur `pepiniere`.
//!
//! ## Features
//!
//! - Implémentation du contrat `Datastore` sur tokio-postgres avec pool
//!   de connexions (TLS optionnel via rustls)
//! - Traduction des descripteurs de requête en SQL paramétré, lignes en
//!   JSON de bout en bout
//! - Amorçage du schéma et semis idempotent du catalogue des types
//!
//! ## Usage CLI
//!
//! ```bash
//! # Initialiser le schéma et le catalogue
//! pepiniere-pg init
//!
//! # Créer une parcelle puis journaliser une plantation
//! pepiniere-pg parcelles add --code NORD-01 --nom "Parcelle nord" \
//!     --surface 5200 --sol limoneux --pente 4 --exposition nord
//! pepiniere-pg activites add --parcelle 1 --type PLANTATION \
//!     --operateur Martin --champ fournisseur="Pépinières Réunies" \
//!     --champ nbr_plants=200 --champ variete=Douglas
//!
//! # Lister avec filtres
//! pepiniere-pg activites list --recherche nord --depuis 2024-01-01
//! ```

pub mod pool;
pub mod schema;
pub mod sql;
pub mod store;

pub use pool::{create_pool, DatabaseConfig, SslMode};
pub use store::PgStore;
