//! Database operations for the admin `PostgreSQL`.
//!
//! ## Tables
//!
//! - `catalog.products` - Catalog products (`external_id` joins to the ERP)
//! - `catalog.product_options` - Product options (one `Size` option per import)
//! - `catalog.product_variants` - Variants with SKU and default price
//! - `catalog.inventory_levels` - Per-location quantities on hand
//! - `admin.sync_runs` - Workflow execution records
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p tradepost-cli -- migrate
//! ```

pub mod catalog;
pub mod sync_runs;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::PgCatalog;
pub use sync_runs::{SyncRun, SyncRunRepository};

/// Embedded admin migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Check that the database answers.
///
/// # Errors
///
/// Returns `sqlx::Error` if the round trip fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
