//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::algolia::AlgoliaError;
use crate::catalog::CatalogError;
use crate::db::RepositoryError;

/// Application-level error type for the admin API.
///
/// Every variant answers with a JSON body `{ "message": ..., "error": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Catalog write failed during a sync.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Search index operation failed.
    #[error("Search index error: {0}")]
    Search(#[from] AlgoliaError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Catalog(_) | Self::Search(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    const fn message(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error",
            Self::Catalog(_) => "Failed to import products from NetSuite",
            Self::Search(_) => "Search index request failed",
            Self::BadRequest(_) => "Bad request",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let error = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = serde_json::json!({
            "message": self.message(),
            "error": error,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[tokio::test]
    async fn test_app_error_status_codes() {
        let (status, _) = body_of(AppError::BadRequest("test".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = body_of(AppError::Internal("test".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) =
            body_of(AppError::Catalog(CatalogError::Write("boom".to_string()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_catalog_error_body() {
        let (_, body) = body_of(AppError::Catalog(CatalogError::Write(
            "duplicate handle".to_string(),
        )))
        .await;

        assert_eq!(body["message"], "Failed to import products from NetSuite");
        assert_eq!(
            body["error"],
            "Catalog error: catalog write failed: duplicate handle"
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (_, body) = body_of(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["error"], "Internal server error");
    }
}
