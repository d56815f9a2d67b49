//! Workflow execution records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use tradepost_core::{SyncRunId, SyncRunStatus};

use super::RepositoryError;

const RUN_COLUMNS: &str =
    "id, workflow, status, input, result, error, started_at, finished_at, expires_at";

/// One recorded workflow run.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SyncRun {
    pub id: SyncRunId,
    pub workflow: String,
    pub status: SyncRunStatus,
    pub input: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// Repository for `admin.sync_runs`.
pub struct SyncRunRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SyncRunRepository<'a> {
    /// Create a new sync run repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a `running` record that expires after `retention`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn start(
        &self,
        workflow: &str,
        input: &serde_json::Value,
        retention: chrono::Duration,
    ) -> Result<SyncRun, RepositoryError> {
        let run = sqlx::query_as::<_, SyncRun>(&format!(
            r"
            INSERT INTO admin.sync_runs (workflow, status, input, expires_at)
            VALUES ($1, 'running', $2, now() + $3)
            RETURNING {RUN_COLUMNS}
            "
        ))
        .bind(workflow)
        .bind(input)
        .bind(retention)
        .fetch_one(self.pool)
        .await?;

        Ok(run)
    }

    /// Move a run to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if `status` is not terminal,
    /// `RepositoryError::NotFound` if the run does not exist (or already finished).
    pub async fn finish(
        &self,
        id: SyncRunId,
        status: SyncRunStatus,
        result: Option<&serde_json::Value>,
        error: Option<&str>,
    ) -> Result<SyncRun, RepositoryError> {
        if !status.is_terminal() {
            return Err(RepositoryError::DataCorruption(format!(
                "cannot finish run {id} as {status}"
            )));
        }

        let run = sqlx::query_as::<_, SyncRun>(&format!(
            r"
            UPDATE admin.sync_runs
            SET status = $2, result = $3, error = $4, finished_at = now()
            WHERE id = $1 AND status = 'running'
            RETURNING {RUN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(result)
        .bind(error)
        .fetch_optional(self.pool)
        .await?;

        run.ok_or(RepositoryError::NotFound)
    }

    /// Most recent runs first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<SyncRun>, RepositoryError> {
        let runs = sqlx::query_as::<_, SyncRun>(&format!(
            r"
            SELECT {RUN_COLUMNS}
            FROM admin.sync_runs
            ORDER BY started_at DESC, id DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(runs)
    }

    /// Delete records past their retention window. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.sync_runs WHERE expires_at < now()")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
