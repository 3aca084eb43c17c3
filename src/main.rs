use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use lateshow_catalog::{Catalog, DatabaseError, MemoryDatabase, PgDatabase};
use lateshow_server::{ConfigError, ServerConfig};
use log::{error, info, warn};
use thiserror::Error;

use crate::logging::LogColor;

mod logging;

/// Serves the guests, episodes and appearances of the Late Show.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Apply pending migrations, then serve the API (the default).
    Serve,
    /// Apply pending migrations and exit.
    Migrate,
}

#[derive(Debug, Error)]
enum LateShowError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server stopped: {0}")]
    Server(#[from] std::io::Error),
}

impl LateShowError {
    fn hint(&self) -> String {
        match self {
            LateShowError::Config(_) => "Check the environment or the .env file. LATESHOW_SECRET_KEY is required, DATABASE_URL is optional.".to_string(),
            LateShowError::Database(_) => "This is a database error. Make sure the PostgreSQL instance in DATABASE_URL is running and reachable, then try again.".to_string(),
            LateShowError::Server(_) => "Make sure LATESHOW_PORT is free and can be bound.".to_string(),
        }
    }
}

async fn connect(url: &str) -> Result<PgDatabase, DatabaseError> {
    info!("Connecting to database...");
    let database = PgDatabase::new(url).await?;

    info!("Applying migrations...");
    database.migrate().await?;

    Ok(database)
}

async fn run(command: Command) -> Result<(), LateShowError> {
    let config = ServerConfig::from_env()?;

    match command {
        Command::Migrate => match &config.database_url {
            Some(url) => {
                connect(url).await?;
            }
            None => warn!("DATABASE_URL is not set, there is nothing to migrate"),
        },
        Command::Serve => {
            let catalog = match &config.database_url {
                Some(url) => Catalog::new(connect(url).await?, config.auth_settings()),
                None => {
                    warn!("DATABASE_URL is not set, data will only be kept in memory");
                    Catalog::new(MemoryDatabase::new(), config.auth_settings())
                }
            };

            info!("Initialized successfully.");
            lateshow_server::run_server(config.port, catalog).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logger();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli.command.unwrap_or(Command::Serve)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{} Read the error below to troubleshoot the issue.", "Late Show API failed!".bold().color(LogColor::RED));
            error!("{}", error);
            error!(
                "{}",
                format!("Hint: {}", error.hint())
                    .color(LogColor::DIMMED)
                    .italic()
            );

            ExitCode::FAILURE
        }
    }
}
