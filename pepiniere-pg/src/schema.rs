//! Amorçage du schéma PostgreSQL et semis du catalogue des types

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use tracing::info;

/// Catalogue semé à l'initialisation: code stable → libellé
const TYPE_CATALOG: &[(&str, &str)] = &[
    ("PLANTATION", "Plantation"),
    ("FERTILISATION", "Fertilisation"),
    ("PHYTOSANITAIRE", "Traitement phytosanitaire"),
    ("IRRIGATION", "Irrigation"),
    ("DESHERBAGE", "Désherbage"),
    ("RECOLTE", "Récolte"),
    ("OBSERVATION", "Observation"),
];

/// Crée le schéma et les tables s'ils n'existent pas
pub async fn create_schema(pool: &Pool, schema: &str, drop_existing: bool) -> Result<()> {
    let client = pool.get().await?;

    if drop_existing {
        client
            .execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema), &[])
            .await
            .context("Failed to drop schema")?;
    }

    client
        .execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema), &[])
        .await
        .context("Failed to create schema")?;

    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {schema}.type_activite (
            type_activite_id BIGSERIAL PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            libelle TEXT NOT NULL,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS {schema}.parcelle (
            parcelle_id BIGSERIAL PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            nom TEXT NOT NULL,
            surface_m2 DOUBLE PRECISION NOT NULL DEFAULT 0,
            type_sol TEXT NOT NULL,
            pente_deg DOUBLE PRECISION NOT NULL DEFAULT 0,
            exposition TEXT NOT NULL,
            date_creation DATE NOT NULL,
            geom_coordonnee JSONB,
            created_at TIMESTAMPTZ DEFAULT NOW(),
            updated_at TIMESTAMPTZ DEFAULT NOW()
        );

        CREATE TABLE IF NOT EXISTS {schema}.espece (
            espece_id BIGSERIAL PRIMARY KEY,
            nom TEXT NOT NULL,
            variete TEXT NOT NULL,
            description TEXT,
            created_at TIMESTAMPTZ DEFAULT NOW(),
            updated_at TIMESTAMPTZ DEFAULT NOW()
        );

        CREATE TABLE IF NOT EXISTS {schema}.activite (
            activite_id BIGSERIAL PRIMARY KEY,
            parcelle_id BIGINT NOT NULL REFERENCES {schema}.parcelle(parcelle_id),
            type_activite_id BIGINT NOT NULL REFERENCES {schema}.type_activite(type_activite_id),
            date_activite DATE NOT NULL,
            operateur TEXT NOT NULL,
            commentaire_general TEXT,
            zone_concernee TEXT,
            details JSONB NOT NULL DEFAULT '{{}}'::jsonb,
            created_at TIMESTAMPTZ DEFAULT NOW(),
            updated_at TIMESTAMPTZ DEFAULT NOW()
        );

        CREATE TABLE IF NOT EXISTS {schema}.parcelle_espece (
            parcelle_espece_id BIGSERIAL PRIMARY KEY,
            parcelle_id BIGINT NOT NULL REFERENCES {schema}.parcelle(parcelle_id),
            espece_id BIGINT NOT NULL REFERENCES {schema}.espece(espece_id),
            quantite BIGINT NOT NULL DEFAULT 0,
            date_plantation DATE,
            created_at TIMESTAMPTZ DEFAULT NOW(),
            updated_at TIMESTAMPTZ DEFAULT NOW(),
            CONSTRAINT parcelle_espece_unique UNIQUE (parcelle_id, espece_id)
        );

        CREATE INDEX IF NOT EXISTS idx_activite_date ON {schema}.activite (date_activite);
        CREATE INDEX IF NOT EXISTS idx_activite_parcelle ON {schema}.activite (parcelle_id);
        CREATE INDEX IF NOT EXISTS idx_activite_type ON {schema}.activite (type_activite_id);
        CREATE INDEX IF NOT EXISTS idx_parcelle_espece_parcelle ON {schema}.parcelle_espece (parcelle_id);
        "#
    );

    client
        .batch_execute(&ddl)
        .await
        .context("Failed to create tables")?;

    info!("Schéma {} prêt", schema);
    Ok(())
}

/// Sème le catalogue des types d'activités; idempotent (les codes déjà
/// présents sont laissés tels quels). Retourne le nombre de types ajoutés.
pub async fn seed_type_catalog(pool: &Pool, schema: &str) -> Result<usize> {
    let client = pool.get().await?;
    let sql = format!(
        "INSERT INTO {}.type_activite (code, libelle) VALUES ($1, $2) ON CONFLICT (code) DO NOTHING",
        schema
    );
    let stmt = client
        .prepare(&sql)
        .await
        .context("Failed to prepare catalog seed")?;

    let mut inserted = 0usize;
    for (code, libelle) in TYPE_CATALOG.iter().copied() {
        inserted += client
            .execute(&stmt, &[&code, &libelle])
            .await
            .with_context(|| format!("Failed to seed type {}", code))? as usize;
    }

    info!("Catalogue des types: {} ajout(s)", inserted);
    Ok(inserted)
}
