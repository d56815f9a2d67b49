//! `NetSuite` diagnostics.

use tradepost_admin::config::NetSuiteConfig;
use tradepost_admin::netsuite::NetSuiteClient;

use super::{CommandError, print_json};

fn client() -> Result<NetSuiteClient, CommandError> {
    let config = NetSuiteConfig::from_env()?;
    Ok(NetSuiteClient::new(&config)?)
}

/// Probe the `SuiteQL` endpoint with the configured credentials.
pub async fn test() -> Result<(), CommandError> {
    let client = client()?;
    let summary = client.config_summary();

    if client.test_connection().await {
        tracing::info!(base_url = %summary.base_url, realm = %summary.realm, "NetSuite connection successful");
        Ok(())
    } else {
        Err(CommandError::Failed(format!(
            "NetSuite connection failed ({})",
            summary.base_url
        )))
    }
}

/// Run an arbitrary `SuiteQL` statement and print the outcome.
pub async fn query(statement: &str) -> Result<(), CommandError> {
    let outcome = client()?.query(statement).await;
    print_json(&outcome)?;

    if outcome.success {
        Ok(())
    } else {
        Err(CommandError::Failed(
            outcome.error.unwrap_or_else(|| "query failed".to_string()),
        ))
    }
}
