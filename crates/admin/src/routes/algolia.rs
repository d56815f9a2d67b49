//! Algolia route handlers.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::AppError;
use crate::state::AppState;
use crate::sync::{SEARCH_SYNC_WORKFLOW, SearchSyncReport, SearchSyncWorkflow};
use crate::sync::search::DEFAULT_PAGE_SIZE;

/// Query parameters for a search sync.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSyncParams {
    pub page_size: u32,
}

impl Default for SearchSyncParams {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchSyncResponse {
    pub message: &'static str,
    pub result: SearchSyncReport,
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub message: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Push every published product to the search index.
#[instrument(skip(state))]
pub async fn sync(
    State(state): State<AppState>,
    Query(params): Query<SearchSyncParams>,
) -> Result<Json<SearchSyncResponse>, AppError> {
    let index = state
        .algolia()
        .ok_or_else(|| AppError::BadRequest("Algolia is not configured".to_string()))?;

    info!(page_size = params.page_size, "Manual search sync triggered");

    let workflow = SearchSyncWorkflow::new(state.catalog(), index);
    let report = state
        .runs()
        .record(SEARCH_SYNC_WORKFLOW, &params, async {
            Ok::<_, Infallible>(workflow.run(params.page_size).await)
        })
        .await;

    let Ok(report) = report;

    Ok(Json(SearchSyncResponse {
        message: "Search index sync completed",
        result: report,
    }))
}

/// Check Algolia credentials with an empty search.
#[instrument(skip(state))]
pub async fn test_connection(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = match state.algolia() {
        Some(client) => client.test_connection().await.map_err(|e| e.to_string()),
        None => Err("Algolia is not configured".to_string()),
    };

    match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(ConnectionResponse {
                message: "Algolia connection successful",
                status: "connected",
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Algolia connection test failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ConnectionResponse {
                    message: "Algolia connection failed",
                    status: "failed",
                    error: Some(e),
                }),
            )
        }
    }
}
