//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::algolia::AlgoliaClient;
use crate::config::AdminConfig;
use crate::db::PgCatalog;
use crate::netsuite::NetSuiteClient;
use crate::sync::SyncRunRecorder;

/// Application state shared across all handlers and background jobs.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    catalog: PgCatalog,
    netsuite: NetSuiteClient,
    algolia: Option<AlgoliaClient>,
    runs: SyncRunRecorder,
}

impl AppState {
    /// Build the state from already-constructed clients.
    #[must_use]
    pub fn new(
        config: AdminConfig,
        pool: PgPool,
        netsuite: NetSuiteClient,
        algolia: Option<AlgoliaClient>,
    ) -> Self {
        let catalog = PgCatalog::new(pool.clone());
        let runs = SyncRunRecorder::new(pool.clone(), config.sync.run_retention);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                netsuite,
                algolia,
                runs,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn catalog(&self) -> &PgCatalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn netsuite(&self) -> &NetSuiteClient {
        &self.inner.netsuite
    }

    /// The search client, if Algolia is configured.
    #[must_use]
    pub fn algolia(&self) -> Option<&AlgoliaClient> {
        self.inner.algolia.as_ref()
    }

    #[must_use]
    pub fn runs(&self) -> &SyncRunRecorder {
        &self.inner.runs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl AppState {
    /// State with a lazy pool that never connects and `NetSuite` at `netsuite_url`.
    pub(crate) fn for_tests(netsuite_url: String, sync: crate::config::SyncConfig) -> Self {
        use std::net::{IpAddr, Ipv4Addr};
        use std::time::Duration;

        use secrecy::SecretString;
        use sqlx::postgres::PgPoolOptions;

        use crate::config::NetSuiteConfig;

        let netsuite = NetSuiteConfig {
            realm: "1234567_SB1".to_string(),
            base_url: netsuite_url,
            consumer_key: SecretString::from("ck-3f9a0c7e51b24d68"),
            consumer_secret: SecretString::from("cs-8d21e4b07f6a5c93"),
            token_id: SecretString::from("ti-5b7c2e9d04a1f836"),
            token_secret: SecretString::from("ts-a04e6f1b8c3d2795"),
            timeout: Duration::from_secs(5),
        };
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost:1/tradepost"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 9000,
            netsuite: netsuite.clone(),
            algolia: None,
            sync,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://localhost:1/tradepost")
            .unwrap();
        let client = NetSuiteClient::new(&netsuite).unwrap();

        Self::new(config, pool, client, None)
    }
}
