//! Request signing and the `SuiteQL` client against a local fake endpoint.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use tradepost_admin::config::NetSuiteConfig;
use tradepost_admin::netsuite::oauth::{
    OAuthCredentials, compute_signature, sign_request, signature_base_string, signing_key,
};
use tradepost_admin::netsuite::{ErpQuery, NetSuiteClient};
use tradepost_admin::sync::{ImportRequest, import_products};

fn credentials() -> OAuthCredentials {
    OAuthCredentials {
        realm: "1234567_SB1".to_string(),
        consumer_key: SecretString::from("ck-3f9a0c7e51b24d68"),
        consumer_secret: SecretString::from("cs-8d21e4b07f6a5c93"),
        token_id: SecretString::from("ti-5b7c2e9d04a1f836"),
        token_secret: SecretString::from("ts-a04e6f1b8c3d2795"),
    }
}

/// Pull `key="value"` out of an `OAuth` header, percent-decoded.
fn header_param(header: &str, key: &str) -> String {
    let marker = format!("{key}=\"");
    let start = header.find(&marker).unwrap() + marker.len();
    let rest = header.get(start..).unwrap();
    let end = rest.find('"').unwrap();
    urlencoding::decode(rest.get(..end).unwrap())
        .unwrap()
        .into_owned()
}

/// Recompute the signature of `header` from its own oauth parameters.
fn verify(header: &str, method: &str, url: &Url, creds: &OAuthCredentials) -> bool {
    let mut params: Vec<(String, String)> = [
        "oauth_consumer_key",
        "oauth_token",
        "oauth_signature_method",
        "oauth_timestamp",
        "oauth_nonce",
        "oauth_version",
    ]
    .iter()
    .map(|k| ((*k).to_string(), header_param(header, k)))
    .collect();
    params.extend(
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned())),
    );

    let base = signature_base_string(method, url, &params);
    let expected = compute_signature(&base, &signing_key(creds)).unwrap();
    expected == header_param(header, "oauth_signature")
}

#[test]
fn test_two_signatures_differ_but_both_verify() {
    let creds = credentials();
    let url = Url::parse(
        "https://1234567-sb1.suitetalk.api.netsuite.com/services/rest/query/v1/suiteql?limit=5",
    )
    .unwrap();

    let first = sign_request("POST", &url, &creds).unwrap();
    let second = sign_request("POST", &url, &creds).unwrap();

    assert_ne!(first.nonce(), second.nonce());
    assert_ne!(first.signature(), second.signature());
    assert!(verify(first.value(), "POST", &url, &creds));
    assert!(verify(second.value(), "POST", &url, &creds));
}

#[test]
fn test_signature_does_not_verify_with_other_secret() {
    let creds = credentials();
    let url = Url::parse("https://example.com/services/rest/query/v1/suiteql").unwrap();
    let header = sign_request("POST", &url, &creds).unwrap();

    let mut other = credentials();
    other.token_secret = SecretString::from("ts-ffffffffffffffff");

    assert!(!verify(header.value(), "POST", &url, &other));
}

// =============================================================================
// Client against a fake endpoint
// =============================================================================

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base_url: String) -> NetSuiteConfig {
    NetSuiteConfig {
        realm: "1234567_SB1".to_string(),
        base_url,
        consumer_key: SecretString::from("ck-3f9a0c7e51b24d68"),
        consumer_secret: SecretString::from("cs-8d21e4b07f6a5c93"),
        token_id: SecretString::from("ti-5b7c2e9d04a1f836"),
        token_secret: SecretString::from("ts-a04e6f1b8c3d2795"),
        timeout: Duration::from_secs(5),
    }
}

async fn suiteql(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let signed = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("OAuth realm=\"1234567_SB1\""));
    let transient = headers.get("prefer").and_then(|v| v.to_str().ok()) == Some("transient");

    if !signed || !transient || body.get("q").is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "title": "Unauthorized",
                "o:errorDetails": [{"detail": "Invalid login attempt."}]
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "count": 3,
            "hasMore": false,
            "items": [
                {"item_id": 1, "item_name": "Widget", "location": "A", "quantity_on_hand": "5"},
                {"item_id": 1, "item_name": "Widget", "location": "B", "quantity_on_hand": 3.0},
                {"item_id": 2, "item_name": "Gadget", "location": null, "quantity_on_hand": null}
            ]
        })),
    )
}

#[tokio::test]
async fn test_import_through_real_client() {
    let base = spawn(Router::new().route("/services/rest/query/v1/suiteql", post(suiteql))).await;
    let client = NetSuiteClient::new(&config(base)).unwrap();

    let batch = import_products(&client, ImportRequest::default()).await;

    assert!(batch.error.is_none());
    assert_eq!(batch.products.len(), 2);
    let widget = batch.products.first().unwrap();
    assert_eq!(widget.external_id, "1");
    assert_eq!(widget.inventory.len(), 2);
    assert_eq!(widget.inventory.get(1).map(|q| q.quantity), Some(3));
}

#[tokio::test]
async fn test_rejection_becomes_failed_outcome() {
    let base = spawn(Router::new().route(
        "/services/rest/query/v1/suiteql",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "title": "Bad Request",
                    "o:errorDetails": [{"detail": "Invalid search query."}]
                })),
            )
        }),
    ))
    .await;
    let client = NetSuiteClient::new(&config(base)).unwrap();

    let outcome = ErpQuery::query(&client, "SELECT nonsense").await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("Invalid search query."));
    assert!(outcome.details.is_some());
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_connection_test() {
    // Nothing listens on the discard port.
    let client = NetSuiteClient::new(&config("http://127.0.0.1:9".to_string())).unwrap();

    assert!(!client.test_connection().await);
}
