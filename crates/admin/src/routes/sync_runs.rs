//! Workflow run history.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::db::{SyncRun, SyncRunRepository};
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct RunsQuery {
    pub limit: Option<i64>,
}

impl RunsQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// List the most recent workflow runs, newest first.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<SyncRun>>, AppError> {
    let runs = SyncRunRepository::new(state.pool())
        .list_recent(query.limit())
        .await?;

    Ok(Json(runs))
}
