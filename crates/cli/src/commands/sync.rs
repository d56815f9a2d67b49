//! Manual sync runs.
//!
//! Both commands record their run in `admin.sync_runs`, exactly like the
//! HTTP endpoints.

use tradepost_admin::algolia::AlgoliaClient;
use tradepost_admin::config::AdminConfig;
use tradepost_admin::db;
use tradepost_admin::netsuite::NetSuiteClient;
use tradepost_admin::state::AppState;
use tradepost_admin::sync::{
    ImportRequest, PRODUCT_SYNC_WORKFLOW, ProductSyncWorkflow, SEARCH_SYNC_WORKFLOW,
    SearchSyncWorkflow,
};

use super::{CommandError, print_json};

async fn state() -> Result<AppState, CommandError> {
    let config = AdminConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let netsuite = NetSuiteClient::new(&config.netsuite)?;
    let algolia = config.algolia.as_ref().map(AlgoliaClient::new).transpose()?;

    Ok(AppState::new(config, pool, netsuite, algolia))
}

/// Import products from `NetSuite` into the catalog.
pub async fn products(limit: usize, offset: usize) -> Result<(), CommandError> {
    let state = state().await?;
    let request = ImportRequest { limit, offset };

    let workflow = ProductSyncWorkflow::new(state.netsuite(), state.catalog(), state.catalog());
    let report = state
        .runs()
        .record(PRODUCT_SYNC_WORKFLOW, &request, workflow.run(request))
        .await?;

    print_json(&report)?;

    match report.import_error {
        Some(e) => Err(CommandError::Failed(format!("NetSuite import failed: {e}"))),
        None => Ok(()),
    }
}

/// Push every published product to the search index.
pub async fn search(page_size: u32) -> Result<(), CommandError> {
    let state = state().await?;
    let index = state
        .algolia()
        .ok_or_else(|| CommandError::Failed("Algolia is not configured".to_string()))?;

    let workflow = SearchSyncWorkflow::new(state.catalog(), index);
    let report = state
        .runs()
        .record(SEARCH_SYNC_WORKFLOW, &page_size, async {
            Ok::<_, std::convert::Infallible>(workflow.run(page_size).await)
        })
        .await;
    let Ok(report) = report;

    print_json(&report)?;

    if report.errors > 0 {
        return Err(CommandError::Failed(format!(
            "{} of {} batches failed",
            report.errors, report.batches
        )));
    }
    Ok(())
}
