//! `SuiteTalk` REST client.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument};
use url::Url;

use super::oauth::{OAuthCredentials, sign_request};
use super::queries;
use super::types::{QueryOutcome, SuiteQlPage};
use super::{ErpQuery, NetSuiteError};
use crate::config::NetSuiteConfig;

/// `SuiteQL` endpoint path, appended to the configured base URL.
const SUITEQL_PATH: &str = "/services/rest/query/v1/suiteql";

/// `SuiteTalk` REST API client.
///
/// Constructed once at startup and cloned freely; it holds only immutable
/// credentials and a pooled HTTP client.
#[derive(Clone)]
pub struct NetSuiteClient {
    inner: Arc<NetSuiteClientInner>,
}

struct NetSuiteClientInner {
    client: reqwest::Client,
    credentials: OAuthCredentials,
    base_url: String,
    suiteql_url: Url,
}

/// Non-secret connection details, safe to return from the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetSuiteConfigSummary {
    pub base_url: String,
    pub realm: String,
}

impl NetSuiteClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `NetSuiteError::InvalidUrl` if the base URL is malformed, or
    /// `NetSuiteError::Http` if the HTTP client cannot be built.
    pub fn new(config: &NetSuiteConfig) -> Result<Self, NetSuiteError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let suiteql_url = Url::parse(&format!("{base_url}{SUITEQL_PATH}"))
            .map_err(|e| NetSuiteError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(NetSuiteClientInner {
                client,
                credentials: OAuthCredentials::from(config),
                base_url,
                suiteql_url,
            }),
        })
    }

    /// Run a `SuiteQL` statement and decode the result page.
    ///
    /// # Errors
    ///
    /// Returns `NetSuiteError::Status` on a non-2xx response (message taken
    /// from the upstream body), `NetSuiteError::Http` on transport failures
    /// and `NetSuiteError::Parse` if the body is not a result page.
    #[instrument(skip(self, statement), fields(url = %self.inner.suiteql_url))]
    pub async fn execute(&self, statement: &str) -> Result<SuiteQlPage, NetSuiteError> {
        let url = &self.inner.suiteql_url;
        let header = sign_request("POST", url, &self.inner.credentials)?;

        debug!(authorization = %header.redacted(), url = %url, "Sending SuiteQL request");

        let response = self
            .inner
            .client
            .post(url.clone())
            .header("Authorization", header.value())
            .header("Content-Type", "application/json")
            .header("Prefer", "transient")
            .json(&serde_json::json!({ "q": statement }))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = serde_json::from_slice::<serde_json::Value>(&bytes).ok();
            let message = body
                .as_ref()
                .and_then(upstream_message)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());

            return Err(NetSuiteError::Status {
                status: status.as_u16(),
                message,
                body,
            });
        }

        let page: SuiteQlPage = serde_json::from_slice(&bytes)?;
        debug!(count = page.count, has_more = page.has_more, "SuiteQL page received");
        Ok(page)
    }

    /// Run a `SuiteQL` statement, folding every failure into the outcome.
    pub async fn query(&self, statement: &str) -> QueryOutcome {
        match self.execute(statement).await {
            Ok(page) => QueryOutcome::ok(page),
            Err(e) => {
                error!(error = %e, "SuiteQL query failed");
                e.into_outcome()
            }
        }
    }

    /// Check that the credentials are accepted and items are readable.
    pub async fn test_connection(&self) -> bool {
        info!("Testing NetSuite connection");
        let outcome = self.query(queries::CONNECTION_PROBE).await;
        if outcome.success {
            info!("NetSuite connection test successful");
        } else {
            error!(error = ?outcome.error, "NetSuite connection test failed");
        }
        outcome.success
    }

    /// Run the product/inventory statement and return the raw outcome.
    pub async fn test_inventory_query(&self) -> QueryOutcome {
        self.query(queries::PRODUCT_INVENTORY).await
    }

    /// Base URL and realm, without credentials.
    #[must_use]
    pub fn config_summary(&self) -> NetSuiteConfigSummary {
        NetSuiteConfigSummary {
            base_url: self.inner.base_url.clone(),
            realm: self.inner.credentials.realm.clone(),
        }
    }
}

impl ErpQuery for NetSuiteClient {
    async fn query(&self, statement: &str) -> QueryOutcome {
        Self::query(self, statement).await
    }
}

/// Pull a human-readable message out of a `SuiteTalk` error body.
///
/// Bodies look like `{"title": "...", "o:errorDetails": [{"detail": "..."}]}`.
fn upstream_message(body: &serde_json::Value) -> Option<String> {
    let title = body.get("title").and_then(serde_json::Value::as_str);
    let detail = body
        .get("o:errorDetails")
        .and_then(|details| details.get(0))
        .and_then(|detail| detail.get("detail"))
        .and_then(serde_json::Value::as_str);

    match (title, detail) {
        (Some(title), Some(detail)) => Some(format!("{title}: {detail}")),
        (Some(message), None) | (None, Some(message)) => Some(message.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use secrecy::SecretString;
    use serde_json::{Value, json};

    use super::*;

    fn config(base_url: &str) -> NetSuiteConfig {
        NetSuiteConfig {
            realm: "1234567_SB1".to_string(),
            base_url: base_url.to_string(),
            consumer_key: SecretString::from("ck-abc123"),
            consumer_secret: SecretString::from("cs-def456"),
            token_id: SecretString::from("tk-ghi789"),
            token_secret: SecretString::from("ts-jkl012"),
            timeout: Duration::from_secs(5),
        }
    }

    /// Serve `router` on an ephemeral loopback port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_upstream_message_prefers_title_and_detail() {
        let body = json!({
            "title": "Bad Request",
            "o:errorDetails": [{ "detail": "Invalid search query.", "o:errorCode": "INVALID_PARAMETER" }]
        });
        assert_eq!(
            upstream_message(&body).as_deref(),
            Some("Bad Request: Invalid search query.")
        );
        assert_eq!(
            upstream_message(&json!({ "title": "Unauthorized" })).as_deref(),
            Some("Unauthorized")
        );
        assert_eq!(upstream_message(&json!({})), None);
    }

    #[test]
    fn test_config_summary_has_no_secrets() {
        let client = NetSuiteClient::new(&config("https://1234567-sb1.suitetalk.api.netsuite.com/"))
            .unwrap();
        let summary = client.config_summary();

        assert_eq!(summary.base_url, "https://1234567-sb1.suitetalk.api.netsuite.com");
        assert_eq!(summary.realm, "1234567_SB1");
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("baseUrl"));
        assert!(!json.contains("ck-abc123"));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = NetSuiteClient::new(&config("not a url"));
        assert!(matches!(result, Err(NetSuiteError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_query_sends_signed_transient_request() {
        let seen: Arc<Mutex<Option<(HeaderMap, Value)>>> = Arc::default();
        let captured = Arc::clone(&seen);

        let router = Router::new().route(
            SUITEQL_PATH,
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = Arc::clone(&captured);
                async move {
                    *captured.lock().unwrap() = Some((headers, body));
                    Json(json!({
                        "count": 1,
                        "hasMore": false,
                        "items": [{ "item_id": "1", "location": "A", "quantity_on_hand": "5" }]
                    }))
                }
            }),
        );
        let client = NetSuiteClient::new(&config(&serve(router).await)).unwrap();

        let outcome = client.query("SELECT 1").await;

        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap().items.len(), 1);

        let (headers, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(body, json!({ "q": "SELECT 1" }));
        assert_eq!(headers.get("prefer").unwrap(), "transient");
        let auth = headers.get("authorization").unwrap().to_str().unwrap();
        assert!(auth.starts_with("OAuth realm=\"1234567_SB1\""));
        assert!(auth.contains("oauth_signature_method=\"HMAC-SHA256\""));
    }

    #[tokio::test]
    async fn test_query_collapses_upstream_errors() {
        let router = Router::new().route(
            SUITEQL_PATH,
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "title": "Unauthorized", "status": 401 })),
                )
            }),
        );
        let client = NetSuiteClient::new(&config(&serve(router).await)).unwrap();

        let outcome = client.query("SELECT 1").await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Unauthorized"));
        assert!(outcome.details.is_some());
        assert!(!client.test_connection().await);
    }

    #[tokio::test]
    async fn test_query_collapses_malformed_body() {
        let router = Router::new().route(SUITEQL_PATH, post(|| async { "not json" }));
        let client = NetSuiteClient::new(&config(&serve(router).await)).unwrap();

        let outcome = client.query("SELECT 1").await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().starts_with("JSON parse error"));
    }
}
