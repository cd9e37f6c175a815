//! Tests d'intégration PostgreSQL
//!
//! Ces tests nécessitent une base PostgreSQL disponible.
//! Configuration via variables d'environnement:
//! - PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE
//!
//! Exécution:
//! ```bash
//! # Avec PostgreSQL local
//! cargo test --test postgres_integration -- --ignored
//!
//! # Avec Docker
//! docker run -d --name postgres-test -e POSTGRES_PASSWORD=test -p 5432:5432 postgres:16
//! PGPASSWORD=test PGDATABASE=postgres cargo test --test postgres_integration -- --ignored
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use pepiniere::assembler::{ActivityInput, ParcelInput};
use pepiniere::detail::ActiviteDetails;
use pepiniere::filters::ActivityFilter;
use pepiniere::geometry::Boundary;
use pepiniere::types::{Exposition, TypeSol};
use pepiniere::Service;
use pepiniere_pg::{create_pool, schema, DatabaseConfig, PgStore};

const TEST_SCHEMA: &str = "pepiniere_test";

/// Configuration de test depuis l'environnement
fn test_config() -> DatabaseConfig {
    let mut config = DatabaseConfig::from_env();
    config.schema = TEST_SCHEMA.to_string();
    config
}

/// Prépare une base de test vierge et ouvre une session
async fn setup() -> Result<Service> {
    let config = test_config();
    let pool = create_pool(&config).await?;

    schema::create_schema(&pool, TEST_SCHEMA, true).await?;
    schema::seed_type_catalog(&pool, TEST_SCHEMA).await?;

    let store = Arc::new(PgStore::new(pool, TEST_SCHEMA));
    Ok(Service::open(store).await)
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn detail_fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
#[ignore]
async fn test_seed_is_idempotent() -> Result<()> {
    let config = test_config();
    let pool = create_pool(&config).await?;

    schema::create_schema(&pool, TEST_SCHEMA, true).await?;
    let first = schema::seed_type_catalog(&pool, TEST_SCHEMA).await?;
    let second = schema::seed_type_catalog(&pool, TEST_SCHEMA).await?;

    assert_eq!(first, 7);
    assert_eq!(second, 0);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_catalog_loads_into_registry() -> Result<()> {
    let service = setup().await?;

    assert!(service.registry().is_loaded());
    assert_eq!(service.registry().types().len(), 7);
    // Tri par libellé croissant
    assert_eq!(service.registry().types()[0].libelle, "Désherbage");
    assert!(service.registry().type_by_code("PLANTATION").is_some());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_full_round_trip() -> Result<()> {
    let service = setup().await?;

    // Parcelle avec limite
    let parcelle = service
        .create_parcel(&ParcelInput {
            code: "NORD-01".to_string(),
            nom: "Parcelle nord".to_string(),
            surface_m2: 5200.0,
            type_sol: TypeSol::Limoneux,
            pente_deg: 4.0,
            exposition: Exposition::Nord,
            date_creation: date("2023-04-01"),
            boundary: Boundary::empty(),
        })
        .await?;
    // Limite absente remplacée par le carré par défaut
    assert!(!parcelle.geom_coordonnee.is_empty());

    // Plantation normalisée depuis des saisies texte
    let plantation_id = service
        .registry()
        .type_by_code("PLANTATION")
        .unwrap()
        .type_activite_id;
    let created = service
        .create_activity(&ActivityInput {
            parcelle_id: parcelle.parcelle_id,
            type_activite_id: plantation_id,
            date_activite: date("2024-03-15"),
            operateur: "Martin".to_string(),
            commentaire_general: None,
            zone_concernee: Some("Zone nord".to_string()),
            detail_fields: detail_fields(&[
                ("fournisseur", "Pépinières Réunies"),
                ("nbr_plants", "200"),
                ("variete", "Douglas"),
                ("prix_unitaire", "0.85"),
            ]),
        })
        .await?;

    match &created.details {
        ActiviteDetails::Plantation(d) => {
            assert_eq!(d.nbr_plants, 200);
            assert_eq!(d.prix_unitaire, 0.85);
        }
        other => panic!("unexpected details: {other:?}"),
    }

    // Recherche par nom de parcelle jointe
    let listed = service
        .list_activities(&ActivityFilter {
            search: Some("nord".to_string()),
            ..Default::default()
        })
        .await?
        .expect("réponse courante");
    assert_eq!(listed.len(), 1);

    // Remplacement complet
    let mut replacement = ActivityInput {
        parcelle_id: parcelle.parcelle_id,
        type_activite_id: plantation_id,
        date_activite: date("2024-03-16"),
        operateur: "Durand".to_string(),
        commentaire_general: Some("Reprise".to_string()),
        zone_concernee: None,
        detail_fields: detail_fields(&[
            ("fournisseur", "Pépinières Réunies"),
            ("nbr_plants", "250"),
            ("variete", "Douglas"),
        ]),
    };
    replacement
        .detail_fields
        .insert("prix_unitaire".to_string(), "0.90".to_string());
    let updated = service
        .update_activity(created.activite.activite_id, &replacement)
        .await?;
    assert_eq!(updated.activite.operateur, "Durand");

    // Filtre par borne de date: la nouvelle date est retenue
    let listed = service
        .list_activities(&ActivityFilter {
            date_from: Some(date("2024-03-16")),
            ..Default::default()
        })
        .await?
        .expect("réponse courante");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].activite.date_activite, date("2024-03-16"));

    Ok(())
}
