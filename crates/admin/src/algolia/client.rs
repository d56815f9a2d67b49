//! Algolia REST client.
//!
//! # API Reference
//!
//! - Write host: `https://{app_id}.algolia.net`
//! - Read host: `https://{app_id}-dsn.algolia.net`
//! - Authentication: `X-Algolia-Application-Id` and `X-Algolia-API-Key` headers

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{info, instrument};

use super::types::{
    ApiErrorBody, BatchOperation, BatchRequest, IndexQuery, MultiQueryRequest,
    SaveObjectsResponse, SearchDocument, SearchResponse,
};
use super::{AlgoliaError, SearchIndex};
use crate::config::AlgoliaConfig;

/// Algolia search API client bound to the product index.
#[derive(Clone)]
pub struct AlgoliaClient {
    inner: Arc<AlgoliaClientInner>,
}

struct AlgoliaClientInner {
    client: reqwest::Client,
    write_url: String,
    read_url: String,
    index_name: String,
}

impl AlgoliaClient {
    /// Create a new client for the configured application.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are not valid header values or the
    /// HTTP client fails to build.
    pub fn new(config: &AlgoliaConfig) -> Result<Self, AlgoliaError> {
        let write_url = format!("https://{}.algolia.net", config.app_id);
        let read_url = format!("https://{}-dsn.algolia.net", config.app_id);
        Self::with_hosts(config, write_url, read_url)
    }

    /// Create a client that sends reads and writes to `base_url`.
    ///
    /// # Errors
    ///
    /// Same as [`AlgoliaClient::new`].
    pub fn with_base_url(config: &AlgoliaConfig, base_url: &str) -> Result<Self, AlgoliaError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self::with_hosts(config, base_url.clone(), base_url)
    }

    fn with_hosts(
        config: &AlgoliaConfig,
        write_url: String,
        read_url: String,
    ) -> Result<Self, AlgoliaError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "X-Algolia-Application-Id",
            HeaderValue::from_str(&config.app_id).map_err(|e| {
                AlgoliaError::Unauthorized(format!("Invalid ALGOLIA_APP_ID format: {e}"))
            })?,
        );

        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret()).map_err(|e| {
            AlgoliaError::Unauthorized(format!("Invalid ALGOLIA_API_KEY format: {e}"))
        })?;
        api_key.set_sensitive(true);
        headers.insert("X-Algolia-API-Key", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(AlgoliaClientInner {
                client,
                write_url,
                read_url,
                index_name: config.product_index_name.clone(),
            }),
        })
    }

    /// Name of the product index.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.inner.index_name
    }

    /// Upsert documents, keyed by `objectID`.
    ///
    /// # Errors
    ///
    /// Returns `AlgoliaError::Unauthorized` when the key lacks `addObject`,
    /// `AlgoliaError::RateLimited` on 429 and `AlgoliaError::Api` otherwise.
    #[instrument(skip(self, documents), fields(index = %self.inner.index_name, count = documents.len()))]
    pub async fn save_objects(
        &self,
        documents: &[SearchDocument],
    ) -> Result<SaveObjectsResponse, AlgoliaError> {
        if documents.is_empty() {
            return Ok(SaveObjectsResponse::default());
        }

        let body = BatchRequest {
            requests: documents
                .iter()
                .map(|document| BatchOperation {
                    action: "updateObject",
                    body: document,
                })
                .collect(),
        };

        let url = format!(
            "{}/1/indexes/{}/batch",
            self.inner.write_url,
            urlencoding::encode(&self.inner.index_name)
        );
        let response = self.inner.client.post(&url).json(&body).send().await?;
        let saved: SaveObjectsResponse = handle_response(response).await?;

        info!(count = documents.len(), task_id = saved.task_id, "Indexed products");
        Ok(saved)
    }

    /// Check credentials and index access with an empty, zero-hit query.
    ///
    /// # Errors
    ///
    /// Returns `AlgoliaError` if the request fails.
    #[instrument(skip(self), fields(index = %self.inner.index_name))]
    pub async fn test_connection(&self) -> Result<(), AlgoliaError> {
        let response = self.queries("", Some("hitsPerPage=0")).await?;
        let records = response.results.first().map_or(0, |r| r.nb_hits);
        info!(index = %self.inner.index_name, records, "Algolia connection test successful");
        Ok(())
    }

    async fn queries(
        &self,
        query: &str,
        params: Option<&str>,
    ) -> Result<SearchResponse, AlgoliaError> {
        let body = MultiQueryRequest {
            requests: vec![IndexQuery {
                index_name: &self.inner.index_name,
                query,
                params,
            }],
        };

        let url = format!("{}/1/indexes/*/queries", self.inner.read_url);
        let response = self.inner.client.post(&url).json(&body).send().await?;
        handle_response(response).await
    }
}

impl SearchIndex for AlgoliaClient {
    async fn save_objects(
        &self,
        documents: &[SearchDocument],
    ) -> Result<SaveObjectsResponse, AlgoliaError> {
        Self::save_objects(self, documents).await
    }
}

impl std::fmt::Debug for AlgoliaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgoliaClient")
            .field("index_name", &self.inner.index_name)
            .finish_non_exhaustive()
    }
}

/// Decode a success body or map the failure.
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AlgoliaError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(AlgoliaError::RateLimited(retry_after));
    }

    let bytes = response.bytes().await?;

    if (200..300).contains(&status) {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
        .map(|body| body.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());

    if status == 401 || status == 403 {
        return Err(AlgoliaError::Unauthorized(explain_auth_failure(&message)));
    }

    Err(AlgoliaError::Api { status, message })
}

/// Turn the terse upstream auth messages into actionable ones.
fn explain_auth_failure(message: &str) -> String {
    if message.contains("Not enough rights") {
        "Algolia API key doesn't have write permissions. Use an Admin API key with 'addObject' permission.".to_string()
    } else if message.contains("Invalid Application-Id") {
        "Invalid ALGOLIA_APP_ID. Check your Algolia application ID.".to_string()
    } else if message.contains("Invalid API key") {
        "Invalid ALGOLIA_API_KEY. Check your Algolia API key.".to_string()
    } else {
        message.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::Path;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::{Value, json};

    use super::*;

    fn config() -> AlgoliaConfig {
        AlgoliaConfig {
            app_id: "APP123".to_string(),
            api_key: SecretString::from("f3a9c1e07b5d42e8a6c0b19d7e3f5a2c"),
            product_index_name: "products".to_string(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn document(id: &str) -> SearchDocument {
        SearchDocument {
            object_id: id.to_string(),
            id: id.to_string(),
            title: format!("Product {id}"),
            handle: format!("product-{id}"),
            description: None,
            thumbnail: None,
        }
    }

    #[test]
    fn test_explain_auth_failure() {
        assert!(explain_auth_failure("Not enough rights to add an object").contains("addObject"));
        assert!(explain_auth_failure("Invalid Application-Id or API key").contains("ALGOLIA_APP_ID"));
        assert_eq!(explain_auth_failure("Forbidden"), "Forbidden");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = AlgoliaClient::new(&config()).unwrap();
        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("products"));
        assert!(!debug_output.contains("f3a9c1e07b5d42e8a6c0b19d7e3f5a2c"));
    }

    #[tokio::test]
    async fn test_save_objects_sends_batch_update() {
        let seen: Arc<Mutex<Option<(String, AxumHeaders, Value)>>> = Arc::default();
        let captured = Arc::clone(&seen);

        let router = Router::new().route(
            "/1/indexes/{index}/batch",
            post(
                move |Path(index): Path<String>, headers: AxumHeaders, Json(body): Json<Value>| {
                    let captured = Arc::clone(&captured);
                    async move {
                        *captured.lock().unwrap() = Some((index, headers, body));
                        Json(json!({ "taskID": 7, "objectIDs": ["1", "2"] }))
                    }
                },
            ),
        );
        let client = AlgoliaClient::with_base_url(&config(), &serve(router).await).unwrap();

        let saved = client
            .save_objects(&[document("1"), document("2")])
            .await
            .unwrap();

        assert_eq!(saved.task_id, 7);
        assert_eq!(saved.object_ids, vec!["1", "2"]);

        let (index, headers, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(index, "products");
        assert_eq!(headers.get("x-algolia-application-id").unwrap(), "APP123");
        let requests = body["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests.first().unwrap()["action"], "updateObject");
        assert_eq!(requests.first().unwrap()["body"]["objectID"], "1");
    }

    #[tokio::test]
    async fn test_save_objects_skips_empty_batch() {
        let client = AlgoliaClient::with_base_url(&config(), "http://127.0.0.1:9").unwrap();
        let saved = client.save_objects(&[]).await.unwrap();
        assert!(saved.object_ids.is_empty());
    }

    #[tokio::test]
    async fn test_connection_uses_zero_hit_query() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let captured = Arc::clone(&seen);

        let router = Router::new().route(
            "/1/indexes/{index}/queries",
            post(move |Json(body): Json<Value>| {
                let captured = Arc::clone(&captured);
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(json!({ "results": [{ "hits": [], "nbHits": 0, "page": 0 }] }))
                }
            }),
        );
        let client = AlgoliaClient::with_base_url(&config(), &serve(router).await).unwrap();

        client.test_connection().await.unwrap();

        let body = seen.lock().unwrap().take().unwrap();
        assert_eq!(
            body,
            json!({ "requests": [{ "indexName": "products", "query": "", "params": "hitsPerPage=0" }] })
        );
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let router = Router::new()
            .route(
                "/1/indexes/{index}/batch",
                post(|| async {
                    (
                        StatusCode::FORBIDDEN,
                        Json(json!({ "message": "Not enough rights to add an object", "status": 403 })),
                    )
                }),
            )
            .route(
                "/1/indexes/{index}/queries",
                post(|| async { (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "5")], "slow down") }),
            );
        let client = AlgoliaClient::with_base_url(&config(), &serve(router).await).unwrap();

        let write = client.save_objects(&[document("1")]).await;
        assert!(matches!(write, Err(AlgoliaError::Unauthorized(msg)) if msg.contains("addObject")));

        let read = client.test_connection().await;
        assert!(matches!(read, Err(AlgoliaError::RateLimited(5))));
    }
}
