//! Background jobs.
//!
//! The only job is the scheduled product sync: every `NETSUITE_SYNC_INTERVAL_SECS`
//! it walks the whole `NetSuite` catalog, `NETSUITE_SYNC_BATCH_LIMIT` products
//! per page. Each page is one recorded run, the same as a manual
//! `POST /admin/netsuite/sync-products` with that `limit` and `offset`.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::state::AppState;
use crate::sync::{ImportRequest, PRODUCT_SYNC_WORKFLOW, ProductSyncWorkflow};

/// Periodic product sync driven by a tokio interval.
pub struct ProductSyncJob {
    state: AppState,
    period: Duration,
    batch_limit: usize,
}

impl ProductSyncJob {
    #[must_use]
    pub const fn new(state: AppState, period: Duration, batch_limit: usize) -> Self {
        Self {
            state,
            period,
            batch_limit,
        }
    }

    /// Build the job from config, or `None` when no interval is set.
    #[must_use]
    pub fn from_state(state: &AppState) -> Option<Self> {
        let sync = &state.config().sync;
        let period = sync.interval?;
        Some(Self::new(state.clone(), period, sync.batch_limit))
    }

    /// Spawn the job. It stops when `shutdown` flips to `true` or its
    /// sender is dropped.
    ///
    /// The first tick fires immediately and is skipped so a restart does not
    /// trigger a sync; a tick missed during a long run is dropped rather
    /// than queued.
    #[must_use]
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                period_secs = self.period.as_secs(),
                batch_limit = self.batch_limit,
                "Scheduled product sync started"
            );

            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Scheduled product sync stopping");
                            break;
                        }
                    }
                    _ = ticker.tick() => self.run_once(&shutdown).await,
                }
            }
        })
    }

    /// Sync every page, stopping early on an import failure or shutdown.
    async fn run_once(&self, shutdown: &watch::Receiver<bool>) {
        let mut offset = 0;
        loop {
            let Some(available) = self.run_page(offset).await else {
                return;
            };
            match next_offset(self.batch_limit, offset, available) {
                Some(next) if !*shutdown.borrow() => offset = next,
                _ => return,
            }
        }
    }

    /// Run one recorded page and return the number of products available,
    /// or `None` when the run failed.
    async fn run_page(&self, offset: usize) -> Option<usize> {
        let request = ImportRequest {
            limit: self.batch_limit,
            offset,
        };
        let state = &self.state;
        let workflow = ProductSyncWorkflow::new(state.netsuite(), state.catalog(), state.catalog());

        match state
            .runs()
            .record(PRODUCT_SYNC_WORKFLOW, &request, workflow.run(request))
            .await
        {
            Ok(report) if report.success() => {
                info!(
                    offset,
                    available = report.available,
                    truncated = report.truncated,
                    created = report.result.created_count,
                    updated = report.result.updated_count,
                    inventory = report.result.inventory_upserts,
                    "Scheduled product sync page completed"
                );
                Some(report.available)
            }
            Ok(report) => {
                warn!(
                    offset,
                    error = report.import_error.as_deref().unwrap_or_default(),
                    "Scheduled product sync imported nothing"
                );
                None
            }
            Err(e) => {
                error!(offset, error = %e, "Scheduled product sync failed");
                None
            }
        }
    }
}

/// Offset of the page after `offset`, or `None` once `available` products
/// are covered. A zero `limit` imports everything in one page.
const fn next_offset(limit: usize, offset: usize, available: usize) -> Option<usize> {
    if limit == 0 {
        return None;
    }
    let next = offset.saturating_add(limit);
    if next < available { Some(next) } else { None }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::config::SyncConfig;

    use super::*;

    fn sync_config(interval: Option<Duration>) -> SyncConfig {
        SyncConfig {
            interval,
            ..SyncConfig::default()
        }
    }

    #[tokio::test]
    async fn test_no_interval_means_no_job() {
        let state = AppState::for_tests("http://127.0.0.1:9".to_string(), sync_config(None));

        assert!(ProductSyncJob::from_state(&state).is_none());
    }

    #[tokio::test]
    async fn test_job_uses_configured_batch_limit() {
        let sync = SyncConfig {
            batch_limit: 25,
            ..sync_config(Some(Duration::from_secs(60)))
        };
        let state = AppState::for_tests("http://127.0.0.1:9".to_string(), sync);

        let job = ProductSyncJob::from_state(&state).unwrap();

        assert_eq!(job.period, Duration::from_secs(60));
        assert_eq!(job.batch_limit, 25);
    }

    #[test]
    fn test_next_offset_walks_every_page() {
        let mut offsets = vec![0];
        while let Some(next) = next_offset(10, *offsets.last().unwrap(), 25) {
            offsets.push(next);
        }

        assert_eq!(offsets, vec![0, 10, 20]);
    }

    #[test]
    fn test_next_offset_stops_at_exact_end() {
        assert_eq!(next_offset(10, 10, 20), None);
        assert_eq!(next_offset(10, 0, 0), None);
    }

    #[test]
    fn test_zero_limit_is_a_single_page() {
        assert_eq!(next_offset(0, 0, 500), None);
    }

    #[tokio::test]
    async fn test_job_stops_on_shutdown_before_first_run() {
        let state = AppState::for_tests("http://127.0.0.1:9".to_string(), SyncConfig::default());
        let (tx, rx) = watch::channel(false);

        let handle = ProductSyncJob::new(state, Duration::from_secs(3600), 10).spawn(rx);
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
