//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `NETSUITE_REALM` - `NetSuite` account realm (usually the account ID, e.g. `1234567_SB1`)
//! - `NETSUITE_CONSUMER_KEY` - Consumer key from the integration record
//! - `NETSUITE_CONSUMER_SECRET` - Consumer secret from the integration record (HIGH PRIVILEGE)
//! - `NETSUITE_TOKEN_ID` - Token ID from the access token
//! - `NETSUITE_TOKEN_SECRET` - Token secret from the access token (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 9000)
//! - `NETSUITE_BASE_URL` - Override the `SuiteTalk` base URL derived from the realm
//! - `NETSUITE_TIMEOUT_SECS` - Outbound request timeout (default: 30, must be positive)
//! - `NETSUITE_SYNC_INTERVAL_SECS` - Scheduled product sync interval (default: 3600, 0 disables)
//! - `NETSUITE_SYNC_BATCH_LIMIT` - Products per page of a scheduled run (default: 100, 0 = one page)
//! - `SYNC_RUN_RETENTION_HOURS` - How long workflow run records are kept (default: 24, must be positive)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (Algolia - enables search index sync)
//! - `ALGOLIA_APP_ID` - Algolia application ID
//! - `ALGOLIA_API_KEY` - Algolia admin API key (needs `addObject`)
//! - `ALGOLIA_PRODUCT_INDEX_NAME` - Index that receives published products

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;
const DEFAULT_SYNC_BATCH_LIMIT: usize = 100;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// `NetSuite` ERP configuration
    pub netsuite: NetSuiteConfig,
    /// Algolia configuration (optional - enables search index sync)
    pub algolia: Option<AlgoliaConfig>,
    /// Scheduled sync settings
    pub sync: SyncConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// `NetSuite` token-based authentication configuration.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE credentials.
#[derive(Clone)]
pub struct NetSuiteConfig {
    /// Account realm, sent verbatim in the `OAuth` header
    pub realm: String,
    /// `SuiteTalk` REST base URL (no trailing slash)
    pub base_url: String,
    /// Integration record consumer key
    pub consumer_key: SecretString,
    /// Integration record consumer secret
    pub consumer_secret: SecretString,
    /// Access token ID
    pub token_id: SecretString,
    /// Access token secret
    pub token_secret: SecretString,
    /// Outbound request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for NetSuiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetSuiteConfig")
            .field("realm", &self.realm)
            .field("base_url", &self.base_url)
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .field("token_id", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Algolia search index configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AlgoliaConfig {
    /// Application ID
    pub app_id: String,
    /// Admin API key
    pub api_key: SecretString,
    /// Product index name
    pub product_index_name: String,
}

impl std::fmt::Debug for AlgoliaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgoliaConfig")
            .field("app_id", &self.app_id)
            .field("api_key", &"[REDACTED]")
            .field("product_index_name", &self.product_index_name)
            .finish()
    }
}

/// Scheduled sync settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between scheduled product syncs (`None` = disabled)
    pub interval: Option<Duration>,
    /// Page size of a scheduled sweep (0 = everything in one page)
    pub batch_limit: usize,
    /// Retention window for workflow run records
    pub run_retention: chrono::Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Some(Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS)),
            batch_limit: DEFAULT_SYNC_BATCH_LIMIT,
            run_retention: chrono::Duration::hours(24),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = parse_env("ADMIN_PORT", "9000")?;

        let netsuite = NetSuiteConfig::from_env()?;
        let algolia = AlgoliaConfig::from_env()?;
        let sync = SyncConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            netsuite,
            algolia,
            sync,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns a reference to the Algolia configuration, if available.
    ///
    /// Returns `None` if the Algolia variables are not set, which disables
    /// search index sync.
    #[must_use]
    pub const fn algolia(&self) -> Option<&AlgoliaConfig> {
        self.algolia.as_ref()
    }
}

impl NetSuiteConfig {
    /// Load the ERP credentials from environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a credential is missing or looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let realm = get_required_env("NETSUITE_REALM")?;
        let base_url = get_optional_env("NETSUITE_BASE_URL")
            .map_or_else(|| default_base_url(&realm), |url| url.trim_end_matches('/').to_string());
        let timeout = request_timeout(parse_env("NETSUITE_TIMEOUT_SECS", "30")?)?;

        Ok(Self {
            realm,
            base_url,
            consumer_key: get_validated_secret("NETSUITE_CONSUMER_KEY")?,
            consumer_secret: get_validated_secret("NETSUITE_CONSUMER_SECRET")?,
            token_id: get_validated_secret("NETSUITE_TOKEN_ID")?,
            token_secret: get_validated_secret("NETSUITE_TOKEN_SECRET")?,
            timeout,
        })
    }
}

impl AlgoliaConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let app_id = get_optional_env("ALGOLIA_APP_ID");
        let api_key = get_optional_env("ALGOLIA_API_KEY");
        let index = get_optional_env("ALGOLIA_PRODUCT_INDEX_NAME");

        match (app_id, api_key, index) {
            (Some(app_id), Some(key), Some(product_index_name)) => {
                validate_secret_strength(&key, "ALGOLIA_API_KEY")?;
                Ok(Some(Self {
                    app_id,
                    api_key: SecretString::from(key),
                    product_index_name,
                }))
            }
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ALGOLIA_*".to_string(),
                "ALGOLIA_APP_ID, ALGOLIA_API_KEY and ALGOLIA_PRODUCT_INDEX_NAME must be set together"
                    .to_string(),
            )),
        }
    }
}

impl SyncConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let interval_secs: u64 = parse_env(
            "NETSUITE_SYNC_INTERVAL_SECS",
            &DEFAULT_SYNC_INTERVAL_SECS.to_string(),
        )?;
        let batch_limit = parse_env(
            "NETSUITE_SYNC_BATCH_LIMIT",
            &DEFAULT_SYNC_BATCH_LIMIT.to_string(),
        )?;
        let run_retention = run_retention(parse_env("SYNC_RUN_RETENTION_HOURS", "24")?)?;

        Ok(Self {
            interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            batch_limit,
            run_retention,
        })
    }
}

/// A zero timeout would fail every `NetSuite` request immediately.
fn request_timeout(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "NETSUITE_TIMEOUT_SECS".to_string(),
            "must be greater than 0".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Retention must be positive, or every run record is purged as soon as the
/// next run starts.
fn run_retention(hours: i64) -> Result<chrono::Duration, ConfigError> {
    let invalid = |reason: &str| {
        ConfigError::InvalidEnvVar("SYNC_RUN_RETENTION_HOURS".to_string(), reason.to_string())
    };

    if hours <= 0 {
        return Err(invalid("must be greater than 0"));
    }
    chrono::Duration::try_hours(hours).ok_or_else(|| invalid("out of range"))
}

/// Load only the admin database URL (`ADMIN_DATABASE_URL`, else `DATABASE_URL`).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    get_database_url("ADMIN_DATABASE_URL")
}

/// `SuiteTalk` hosts use the realm lower-cased with `_` replaced by `-`.
fn default_base_url(realm: &str) -> String {
    let account = realm.to_lowercase().replace('_', "-");
    format!("https://{account}.suitetalk.api.netsuite.com")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the value generated by NetSuite/Algolia."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(value.trim(), key)?;
    Ok(SecretString::from(value.trim().to_string()))
}
