//! `NetSuite` route handlers.

use axum::{Json, body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::netsuite::{NetSuiteConfigSummary, QueryOutcome};
use crate::state::AppState;
use crate::sync::{ImportRequest, PRODUCT_SYNC_WORKFLOW, ProductSyncReport, ProductSyncWorkflow};

/// Response of a manual product import.
#[derive(Debug, Serialize)]
pub struct SyncProductsResponse {
    pub message: &'static str,
    pub result: SyncProductsResult,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProductsResult {
    /// Products newly created in the catalog.
    pub imported_count: usize,
    pub updated_count: usize,
    pub inventory_upserts: usize,
    pub metadata_fallbacks: usize,
    pub total_processed: usize,
    pub success: bool,
    /// `NetSuite` returned a capped result set; later products were not seen.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ProductSyncReport> for SyncProductsResult {
    fn from(report: ProductSyncReport) -> Self {
        Self {
            imported_count: report.result.created_count,
            updated_count: report.result.updated_count,
            inventory_upserts: report.result.inventory_upserts,
            metadata_fallbacks: report.result.metadata_fallbacks,
            total_processed: report.result.total_processed,
            success: report.success(),
            truncated: report.truncated,
            error: report.import_error,
        }
    }
}

/// Connection test response.
#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub message: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<NetSuiteConfigSummary>,
}

/// Parse the optional sync body. Empty or whitespace-only means defaults.
fn parse_import_request(body: &[u8]) -> Result<ImportRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ImportRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid sync request body: {e}")))
}

/// Import products from `NetSuite` into the catalog.
///
/// Body is optional whatever the `Content-Type`; `limit` defaults to 10 and
/// `offset` to 0.
#[instrument(skip(state, body))]
pub async fn sync_products(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SyncProductsResponse>, AppError> {
    let request = parse_import_request(&body)?;
    info!(limit = request.limit, offset = request.offset, "Manual product import triggered");

    let workflow = ProductSyncWorkflow::new(state.netsuite(), state.catalog(), state.catalog());
    let report = state
        .runs()
        .record(PRODUCT_SYNC_WORKFLOW, &request, workflow.run(request))
        .await?;

    Ok(Json(SyncProductsResponse {
        message: "Product import from NetSuite completed",
        result: report.into(),
    }))
}

/// Check `NetSuite` credentials.
#[instrument(skip(state))]
pub async fn test_connection(State(state): State<AppState>) -> impl IntoResponse {
    let client = state.netsuite();

    if client.test_connection().await {
        (
            StatusCode::OK,
            Json(ConnectionResponse {
                message: "NetSuite connection successful",
                status: "connected",
                config: Some(client.config_summary()),
            }),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ConnectionResponse {
                message: "NetSuite connection failed",
                status: "failed",
                config: None,
            }),
        )
    }
}

/// Run the product/inventory statement and return the raw outcome.
#[instrument(skip(state))]
pub async fn test_suiteql(State(state): State<AppState>) -> Json<QueryOutcome> {
    Json(state.netsuite().test_inventory_query().await)
}
