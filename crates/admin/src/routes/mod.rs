//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (database)
//!
//! # NetSuite
//! POST /admin/netsuite/sync-products   - Import products ({limit?, offset?})
//! GET  /admin/netsuite/test            - Connection test
//! GET  /admin/netsuite/test-suiteql    - Raw product/inventory query result
//!
//! # Algolia
//! POST /admin/algolia/sync             - Push published products to the index
//! GET  /admin/algolia/test             - Connection test
//!
//! # Workflow runs
//! GET  /admin/sync-runs                - Recent execution records (?limit=)
//! ```
//!
//! There is no authentication layer; the server binds to loopback by default.

pub mod algolia;
pub mod netsuite;
pub mod sync_runs;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        // NetSuite
        .route("/admin/netsuite/sync-products", post(netsuite::sync_products))
        .route("/admin/netsuite/test", get(netsuite::test_connection))
        .route("/admin/netsuite/test-suiteql", get(netsuite::test_suiteql))
        // Algolia
        .route("/admin/algolia/sync", post(algolia::sync))
        .route("/admin/algolia/test", get(algolia::test_connection))
        // Workflow runs
        .route("/admin/sync-runs", get(sync_runs::index))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match crate::db::ping(state.pool()).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::SyncConfig;

    /// Serve a fake `SuiteQL` endpoint answering with `status` and `body`.
    async fn fake_netsuite(status: StatusCode, body: Value) -> String {
        let router = Router::new().route(
            "/services/rest/query/v1/suiteql",
            post(move || async move { (status, axum::Json(body)) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn state(netsuite_url: String) -> AppState {
        AppState::for_tests(netsuite_url, SyncConfig::default())
    }

    async fn send(state: AppState, method: &str, uri: &str) -> Response {
        routes()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn post_json(state: AppState, uri: &str, body: &'static str) -> Response {
        routes()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        let base = fake_netsuite(StatusCode::OK, json!({})).await;

        let response = send(state(base), "GET", "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_without_database_is_unavailable() {
        let base = fake_netsuite(StatusCode::OK, json!({})).await;

        let response = send(state(base), "GET", "/health/ready").await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_netsuite_test_reports_connected() {
        let base = fake_netsuite(StatusCode::OK, json!({"items": [], "count": 0})).await;

        let response = send(state(base.clone()), "GET", "/admin/netsuite/test").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "NetSuite connection successful");
        assert_eq!(body["status"], "connected");
        assert_eq!(body["config"]["realm"], "1234567_SB1");
        assert_eq!(body["config"]["baseUrl"], base);
    }

    #[tokio::test]
    async fn test_netsuite_test_reports_failure_as_500() {
        let base = fake_netsuite(
            StatusCode::UNAUTHORIZED,
            json!({"title": "Unauthorized", "o:errorDetails": [{"detail": "Invalid login attempt."}]}),
        )
        .await;

        let response = send(state(base), "GET", "/admin/netsuite/test").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["status"], "failed");
        assert!(body.get("config").is_none());
    }

    #[tokio::test]
    async fn test_suiteql_returns_raw_outcome() {
        let base = fake_netsuite(
            StatusCode::BAD_REQUEST,
            json!({"title": "Bad Request", "o:errorDetails": [{"detail": "Invalid search query."}]}),
        )
        .await;

        let response = send(state(base), "GET", "/admin/netsuite/test-suiteql").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Bad Request: Invalid search query.");
    }

    #[tokio::test]
    async fn test_algolia_sync_without_config_is_bad_request() {
        let base = fake_netsuite(StatusCode::OK, json!({})).await;

        let response = send(state(base), "POST", "/admin/algolia/sync").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Bad request");
    }

    #[tokio::test]
    async fn test_algolia_test_without_config_fails() {
        let base = fake_netsuite(StatusCode::OK, json!({})).await;

        let response = send(state(base), "GET", "/admin/algolia/test").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"], "Algolia is not configured");
    }

    #[tokio::test]
    async fn test_sync_products_accepts_empty_json_body() {
        // NetSuite rejects the query, so nothing reaches the catalog.
        let base = fake_netsuite(
            StatusCode::UNAUTHORIZED,
            json!({"title": "Unauthorized", "o:errorDetails": [{"detail": "Invalid login attempt."}]}),
        )
        .await;

        let response = post_json(state(base), "/admin/netsuite/sync-products", "").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Product import from NetSuite completed");
        assert_eq!(body["result"]["success"], false);
        assert_eq!(body["result"]["importedCount"], 0);
    }

    #[tokio::test]
    async fn test_sync_products_rejects_malformed_body_as_json() {
        let base = fake_netsuite(StatusCode::OK, json!({})).await;

        let response =
            post_json(state(base), "/admin/netsuite/sync-products", r#"{"limit": "#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Bad request");
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("Invalid sync request body")
        );
    }
}
