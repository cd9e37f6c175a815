//! Point d'entrée CLI pour pepiniere-pg

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou celui du binaire
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;
mod pool;
mod schema;
mod sql;
mod store;

use cli::{Commands, DbArgs};

/// Gestion de pépinière: parcelles, activités de terrain et catalogue des
/// types, adossés à PostgreSQL
#[derive(Parser)]
#[command(name = "pepiniere-pg")]
#[command(author, version)]
#[command(about = "Gestion de pépinière: parcelles et journal d'activités sur PostgreSQL")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    db: DbArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let config = cli.db.config();

    match cli.command {
        Commands::Init { drop_schema } => {
            cli::cmd_init(&config, drop_schema).await?;
        }
        Commands::Parcelles { command } => {
            cli::cmd_parcelles(&config, command).await?;
        }
        Commands::Activites { command } => {
            cli::cmd_activites(&config, command).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
