//! Définition et implémentation des commandes CLI
//!
//! CLI simplifiée:
//! - `init`: schéma + catalogue des types
//! - `parcelles list|add`
//! - `activites list|add`

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use tracing::info;

use pepiniere::assembler::{ActivityInput, ParcelInput};
use pepiniere::error::ServiceError;
use pepiniere::filters::{ActivityFilter, ParcelFilter};
use pepiniere::geometry::Boundary;
use pepiniere::types::{Exposition, TypeSol};
use pepiniere::Service;

use crate::pool::{self, DatabaseConfig};
use crate::store::PgStore;

/// Connexion à la base, surcharge des variables d'environnement
#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// PostgreSQL host (défaut: env PGHOST / localhost)
    #[arg(long, global = true)]
    host: Option<String>,

    /// PostgreSQL port (défaut: env PGPORT / 5432)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Base de données (défaut: env PGDATABASE / pepiniere)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Utilisateur (défaut: env PGUSER / postgres)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Mot de passe (défaut: env PGPASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Mode SSL: disable, prefer, require (défaut: env PGSSLMODE / disable)
    #[arg(long, global = true)]
    ssl: Option<String>,

    /// Schéma cible (défaut: env PEPINIERE_SCHEMA / pepiniere)
    #[arg(long, global = true)]
    schema: Option<String>,
}

impl DbArgs {
    /// Configuration effective: environnement puis surcharges CLI
    pub fn config(&self) -> DatabaseConfig {
        let mut config = DatabaseConfig::from_env();
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = &self.database {
            config.dbname = database.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(ssl) = &self.ssl {
            if let Ok(mode) = ssl.parse() {
                config.ssl_mode = mode;
            }
        }
        if let Some(schema) = &self.schema {
            config.schema = schema.clone();
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialise le schéma et sème le catalogue des types
    Init {
        /// Supprime le schéma existant avant de le recréer
        #[arg(long)]
        drop_schema: bool,
    },

    /// Parcelles: listage et création
    Parcelles {
        #[command(subcommand)]
        command: ParcelleCommands,
    },

    /// Activités: listage et journalisation
    Activites {
        #[command(subcommand)]
        command: ActiviteCommands,
    },
}

#[derive(Subcommand)]
pub enum ParcelleCommands {
    /// Liste les parcelles (tri par nom)
    List {
        /// Recherche libre sur le nom et le code
        #[arg(long)]
        recherche: Option<String>,
    },

    /// Crée une parcelle
    Add {
        /// Code de la parcelle (majuscules, chiffres, tirets)
        #[arg(long)]
        code: String,

        #[arg(long)]
        nom: String,

        /// Surface en m²
        #[arg(long, default_value_t = 0.0)]
        surface: f64,

        /// Type de sol: argileux, sableux, limoneux, calcaire, humifere
        #[arg(long)]
        sol: String,

        /// Pente en degrés, entre 0 et 90
        #[arg(long, default_value_t = 0.0)]
        pente: f64,

        /// Exposition: nord, sud, est, ouest, nord-est, nord-ouest,
        /// sud-est, sud-ouest
        #[arg(long)]
        exposition: String,

        /// Date de création YYYY-MM-DD (défaut: aujourd'hui)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
pub enum ActiviteCommands {
    /// Liste les activités (tri par date décroissante)
    List {
        /// Recherche libre: opérateur, nom ou code de parcelle
        #[arg(long)]
        recherche: Option<String>,

        /// Filtre par identifiant de type
        #[arg(long)]
        type_id: Option<i64>,

        /// Date minimale incluse YYYY-MM-DD
        #[arg(long)]
        depuis: Option<NaiveDate>,

        /// Date maximale incluse YYYY-MM-DD
        #[arg(long)]
        jusqua: Option<NaiveDate>,
    },

    /// Journalise une activité sur une parcelle
    Add {
        /// Identifiant de la parcelle
        #[arg(long)]
        parcelle: i64,

        /// Code du type: PLANTATION, FERTILISATION, PHYTOSANITAIRE,
        /// IRRIGATION, DESHERBAGE, RECOLTE, OBSERVATION
        #[arg(long = "type")]
        type_code: String,

        /// Date de l'activité YYYY-MM-DD (défaut: aujourd'hui)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        operateur: String,

        /// Commentaire général
        #[arg(long)]
        commentaire: Option<String>,

        /// Zone concernée
        #[arg(long)]
        zone: Option<String>,

        /// Champ de détail propre au type, répétable: --champ nom=valeur
        #[arg(long = "champ", value_name = "NOM=VALEUR")]
        champs: Vec<String>,
    },
}

/// Exécute la commande init
pub async fn cmd_init(config: &DatabaseConfig, drop_schema: bool) -> Result<()> {
    let pool = pool::create_pool(config).await?;
    pool::test_connection(&pool).await?;
    info!(schema = config.schema.as_str(), "Initialisation du schéma");

    crate::schema::create_schema(&pool, &config.schema, drop_schema).await?;
    let seeded = crate::schema::seed_type_catalog(&pool, &config.schema).await?;

    println!("Schéma {} prêt ({} type(s) ajouté(s))", config.schema, seeded);
    Ok(())
}

/// Ouvre une session de service sur la base
async fn open_service(config: &DatabaseConfig) -> Result<Service> {
    let pool = pool::create_pool(config).await?;
    pool::test_connection(&pool).await?;
    let store = Arc::new(PgStore::new(pool, config.schema.clone()));
    Ok(Service::open(store).await)
}

/// Exécute une sous-commande parcelles
pub async fn cmd_parcelles(config: &DatabaseConfig, command: ParcelleCommands) -> Result<()> {
    let service = open_service(config).await?;

    match command {
        ParcelleCommands::List { recherche } => {
            let filter = ParcelFilter { search: recherche };
            let parcelles = service
                .list_parcels(&filter)
                .await
                .map_err(display_error)?
                .unwrap_or_default();

            if parcelles.is_empty() {
                println!("Aucune parcelle");
                return Ok(());
            }
            println!(
                "{:<6} {:<10} {:<24} {:>10} {:<10} {:>6}  centre carte",
                "id", "code", "nom", "m²", "sol", "pente"
            );
            for p in parcelles {
                let centre = p.geom_coordonnee.view_center();
                println!(
                    "{:<6} {:<10} {:<24} {:>10.0} {:<10} {:>6.1}  ({:.5}, {:.5})",
                    p.parcelle_id,
                    p.code,
                    p.nom,
                    p.surface_m2,
                    format!("{:?}", p.type_sol).to_lowercase(),
                    p.pente_deg,
                    centre.x,
                    centre.y
                );
            }
        }
        ParcelleCommands::Add {
            code,
            nom,
            surface,
            sol,
            pente,
            exposition,
            date,
        } => {
            let input = ParcelInput {
                code,
                nom,
                surface_m2: surface,
                type_sol: parse_sol(&sol)?,
                pente_deg: pente,
                exposition: parse_exposition(&exposition)?,
                date_creation: date.unwrap_or_else(today),
                // La limite se dessine sur la carte; la création CLI part
                // du carré de remplacement
                boundary: Boundary::empty(),
            };
            let parcelle = service.create_parcel(&input).await.map_err(display_error)?;
            println!("Parcelle {} créée (id {})", parcelle.code, parcelle.parcelle_id);
        }
    }
    Ok(())
}

/// Exécute une sous-commande activités
pub async fn cmd_activites(config: &DatabaseConfig, command: ActiviteCommands) -> Result<()> {
    let service = open_service(config).await?;

    match command {
        ActiviteCommands::List {
            recherche,
            type_id,
            depuis,
            jusqua,
        } => {
            let filter = ActivityFilter {
                search: recherche,
                type_activite_id: type_id,
                date_from: depuis,
                date_to: jusqua,
            };
            let activites = service
                .list_activities(&filter)
                .await
                .map_err(display_error)?
                .unwrap_or_default();

            if activites.is_empty() {
                println!("Aucune activité");
                return Ok(());
            }
            println!(
                "{:<6} {:<12} {:<26} {:<10} {:<16} détails",
                "id", "date", "type", "parcelle", "opérateur"
            );
            for view in activites {
                let libelle = view
                    .type_activite
                    .as_ref()
                    .map(|t| t.libelle.as_str())
                    .unwrap_or("(type inconnu)");
                println!(
                    "{:<6} {:<12} {:<26} {:<10} {:<16} {}",
                    view.activite.activite_id,
                    view.activite.date_activite,
                    libelle,
                    view.activite.parcelle_id,
                    view.activite.operateur,
                    serde_json::to_string(&view.details)?
                );
            }
        }
        ActiviteCommands::Add {
            parcelle,
            type_code,
            date,
            operateur,
            commentaire,
            zone,
            champs,
        } => {
            let type_activite_id = service
                .registry()
                .type_by_code(&type_code.to_uppercase())
                .map(|t| t.type_activite_id)
                .ok_or_else(|| anyhow!("Type d'activité inconnu: {}", type_code))?;

            let input = ActivityInput {
                parcelle_id: parcelle,
                type_activite_id,
                date_activite: date.unwrap_or_else(today),
                operateur,
                commentaire_general: commentaire,
                zone_concernee: zone,
                detail_fields: parse_detail_fields(&champs)?,
            };
            let view = service.create_activity(&input).await.map_err(display_error)?;
            println!(
                "Activité {} journalisée le {} ({})",
                view.activite.activite_id,
                view.activite.date_activite,
                type_code.to_uppercase()
            );
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Transforme les paires --champ nom=valeur en saisies brutes
fn parse_detail_fields(champs: &[String]) -> Result<HashMap<String, String>> {
    let mut fields = HashMap::with_capacity(champs.len());
    for champ in champs {
        let Some((nom, valeur)) = champ.split_once('=') else {
            bail!("Champ invalide: '{}'. Format attendu: nom=valeur", champ);
        };
        fields.insert(nom.trim().to_string(), valeur.trim().to_string());
    }
    Ok(fields)
}

fn parse_sol(s: &str) -> Result<TypeSol> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase())).map_err(|_| {
        anyhow!("Type de sol inconnu: {} (argileux, sableux, limoneux, calcaire, humifere)", s)
    })
}

fn parse_exposition(s: &str) -> Result<Exposition> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
        .map_err(|_| anyhow!("Exposition inconnue: {} (nord, sud, est, ouest, nord-est, …)", s))
}

/// Erreurs de service vers anyhow, erreurs de champ détaillées
fn display_error(error: ServiceError) -> anyhow::Error {
    match error {
        ServiceError::Validation(errors) => {
            let details: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
            anyhow!("Saisie invalide:\n{}", details.join("\n"))
        }
        ServiceError::Store(e) => anyhow!(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detail_fields() {
        let fields = parse_detail_fields(&[
            "fournisseur=Acme".to_string(),
            "nbr_plants = 50".to_string(),
        ])
        .unwrap();
        assert_eq!(fields["fournisseur"], "Acme");
        assert_eq!(fields["nbr_plants"], "50");
    }

    #[test]
    fn test_parse_detail_fields_rejects_bare_name() {
        assert!(parse_detail_fields(&["fournisseur".to_string()]).is_err());
    }

    #[test]
    fn test_parse_sol() {
        assert_eq!(parse_sol("Limoneux").unwrap(), TypeSol::Limoneux);
        assert!(parse_sol("granitique").is_err());
    }

    #[test]
    fn test_parse_exposition() {
        assert_eq!(parse_exposition("nord-est").unwrap(), Exposition::NordEst);
        assert!(parse_exposition("zenith").is_err());
    }
}
