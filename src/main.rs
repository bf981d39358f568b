use std::sync::Arc;

use colored::Colorize;
use config::{Config, ConfigError, MEMORY_DATABASE_URL};
use cuesheet_core::{Cuesheet, DatabaseError, MemoryDatabase, PgDatabase, SharedDatabase};
use cuesheet_server::run_server;
use log::{error, info, warn};
use thiserror::Error;
use tokio::runtime;

mod config;
mod logging;

#[derive(Debug, Error)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server stopped: {0}")]
    Server(#[from] std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl StartupError {
    fn hint(&self) -> String {
        match self {
            StartupError::Config(_) => "Check the environment variables cuesheet is started with. DATABASE_URL and CUESHEET_SECRET are required.".to_string(),
            StartupError::Database(_) => "This is a database error. Make sure Postgres is running and DATABASE_URL points to it, or set DATABASE_URL=memory to try cuesheet without one.".to_string(),
            StartupError::Server(_) => "The server could not bind or keep its socket. Make sure CUESHEET_PORT is free.".to_string(),
            StartupError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

async fn connect(url: &str) -> Result<SharedDatabase, StartupError> {
    if url == MEMORY_DATABASE_URL {
        warn!("Using the in-memory store, nothing will be kept after exit");
        return Ok(Arc::new(MemoryDatabase::new()));
    }

    let database = PgDatabase::new(url).await?;

    info!("Running migrations...");
    database.migrate().await?;

    Ok(Arc::new(database))
}

fn start() -> Result<(), StartupError> {
    info!("Reading configuration...");
    let config = Config::from_env()?;

    info!("Building async runtime...");
    let main_runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("cuesheet-async")
        .build()
        .map_err(|e| StartupError::Fatal(e.to_string()))?;

    main_runtime.block_on(async move {
        info!("Connecting to database...");
        let database = connect(&config.database_url).await?;

        let cuesheet = Cuesheet::new(database, config.cuesheet);
        info!("Initialized successfully.");

        run_server(config.server, cuesheet).await?;

        Ok(())
    })
}

fn main() {
    logging::init_logger();

    if let Err(error) = start() {
        error!(
            "{} Read the error below to troubleshoot the issue.",
            "cuesheet failed to start!".bold().red()
        );
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());

        std::process::exit(1);
    }
}
