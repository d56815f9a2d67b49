//! `NetSuite` ERP integration over `SuiteTalk` REST.
//!
//! # Architecture
//!
//! - OAuth 1.0a token-based authentication, one freshly signed header per request
//! - `SuiteQL` statements sent to `POST /services/rest/query/v1/suiteql` with
//!   `Prefer: transient`
//! - Read-only: products and inventory flow from the ERP into the catalog
//!
//! The adapter never fails outward. [`NetSuiteClient::query`] folds every
//! transport, status and decoding error into a [`QueryOutcome`] that callers
//! must inspect.

pub mod client;
pub mod oauth;
pub mod queries;
pub mod types;

use std::future::Future;

pub use client::{NetSuiteClient, NetSuiteConfigSummary};
pub use oauth::{OAuthCredentials, OAuthHeader};
pub use types::{ExternalProductRow, QueryOutcome, SuiteQlPage};

use thiserror::Error;

/// Errors that can occur when talking to `SuiteTalk`.
#[derive(Debug, Error)]
pub enum NetSuiteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `SuiteTalk` answered with a non-2xx status.
    #[error("NetSuite returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot be joined with the endpoint path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request signing failed.
    #[error("Signing error: {0}")]
    Signing(String),
}

impl NetSuiteError {
    /// Collapse the error into the adapter's `success: false` shape.
    #[must_use]
    pub fn into_outcome(self) -> QueryOutcome {
        match self {
            Self::Status { message, body, .. } => {
                let outcome = QueryOutcome::failed(message);
                match body {
                    Some(body) => outcome.with_details(body),
                    None => outcome,
                }
            }
            other => QueryOutcome::failed(other.to_string()),
        }
    }
}

/// Anything that can run a `SuiteQL` statement.
///
/// Implemented by [`NetSuiteClient`]; the sync pipeline depends only on this
/// trait so it can be driven by in-memory fakes.
pub trait ErpQuery: Send + Sync {
    /// Run one statement. Never fails; inspect `QueryOutcome::success`.
    fn query(&self, statement: &str) -> impl Future<Output = QueryOutcome> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netsuite_error_display() {
        let err = NetSuiteError::Status {
            status: 401,
            message: "Unauthorized".to_string(),
            body: None,
        };
        assert_eq!(err.to_string(), "NetSuite returned 401: Unauthorized");
    }

    #[test]
    fn test_status_error_keeps_upstream_body() {
        let body = serde_json::json!({ "title": "Bad Request" });
        let outcome = NetSuiteError::Status {
            status: 400,
            message: "Bad Request".to_string(),
            body: Some(body.clone()),
        }
        .into_outcome();

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Bad Request"));
        assert_eq!(outcome.details, Some(body));
    }

    #[test]
    fn test_other_errors_use_display() {
        let outcome = NetSuiteError::InvalidUrl("relative URL without a base".to_string())
            .into_outcome();

        assert_eq!(
            outcome.error.as_deref(),
            Some("Invalid URL: relative URL without a base")
        );
        assert!(outcome.details.is_none());
    }
}
