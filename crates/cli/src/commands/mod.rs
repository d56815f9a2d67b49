//! CLI command implementations.

pub mod migrate;
pub mod netsuite;
pub mod sync;

use thiserror::Error;

use tradepost_admin::config::ConfigError;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("NetSuite error: {0}")]
    NetSuite(#[from] tradepost_admin::netsuite::NetSuiteError),

    #[error("Algolia error: {0}")]
    Algolia(#[from] tradepost_admin::algolia::AlgoliaError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] tradepost_admin::catalog::CatalogError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &impl serde::Serialize) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
