//! Execution records for workflow runs.

use std::fmt::Display;
use std::future::Future;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use tradepost_core::{SyncRunId, SyncRunStatus};

use crate::db::SyncRunRepository;

/// Records each workflow run in `admin.sync_runs`.
///
/// Recording is best effort: a database failure is logged and never changes
/// the outcome of the run being recorded.
#[derive(Clone)]
pub struct SyncRunRecorder {
    pool: PgPool,
    retention: chrono::Duration,
}

impl SyncRunRecorder {
    #[must_use]
    pub const fn new(pool: PgPool, retention: chrono::Duration) -> Self {
        Self { pool, retention }
    }

    /// Run `work`, recording its input, result or error.
    ///
    /// # Errors
    ///
    /// Returns whatever `work` returns.
    pub async fn record<T, E, F>(
        &self,
        workflow: &str,
        input: &impl Serialize,
        work: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        let input = serde_json::to_value(input).unwrap_or_default();
        let run_id = self.start(workflow, &input).await;

        let outcome = work.await;

        if let Some(id) = run_id {
            match &outcome {
                Ok(value) => {
                    let result = serde_json::to_value(value).ok();
                    self.finish(id, SyncRunStatus::Succeeded, result.as_ref(), None)
                        .await;
                }
                Err(e) => {
                    self.finish(id, SyncRunStatus::Failed, None, Some(&e.to_string()))
                        .await;
                }
            }
        }

        outcome
    }

    async fn start(&self, workflow: &str, input: &serde_json::Value) -> Option<SyncRunId> {
        let repo = SyncRunRepository::new(&self.pool);

        match repo.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Purged expired sync runs"),
            Err(e) => warn!(error = %e, "Failed to purge expired sync runs"),
        }

        match repo.start(workflow, input, self.retention).await {
            Ok(run) => Some(run.id),
            Err(e) => {
                warn!(workflow, error = %e, "Failed to record sync run start");
                None
            }
        }
    }

    async fn finish(
        &self,
        id: SyncRunId,
        status: SyncRunStatus,
        result: Option<&serde_json::Value>,
        error: Option<&str>,
    ) {
        if let Err(e) = SyncRunRepository::new(&self.pool)
            .finish(id, status, result, error)
            .await
        {
            warn!(run_id = %id, error = %e, "Failed to record sync run result");
        }
    }
}
