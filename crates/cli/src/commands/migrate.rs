//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tp-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migrations live in `crates/admin/migrations/` and are embedded at build time.

use sqlx::PgPool;
use secrecy::ExposeSecret;

use tradepost_admin::config;
use tradepost_admin::db::MIGRATOR;

use super::CommandError;

/// Run the catalog and workflow-run migrations.
pub async fn run() -> Result<(), CommandError> {
    let database_url = config::database_url_from_env()?;

    tracing::info!("Connecting to admin database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running admin migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
