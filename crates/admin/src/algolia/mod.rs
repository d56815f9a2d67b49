//! Algolia search index integration.
//!
//! Published catalog products are pushed to a single product index. Records
//! are keyed by catalog product id, so every push is an upsert.

pub mod client;
pub mod types;

use std::future::Future;

pub use client::AlgoliaClient;
pub use types::{SaveObjectsResponse, SearchDocument};

use thiserror::Error;

/// Errors that can occur when talking to Algolia.
#[derive(Debug, Error)]
pub enum AlgoliaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("Algolia API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The application id or API key was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by Algolia.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Destination for published products.
pub trait SearchIndex: Send + Sync {
    /// Upsert `documents` into the product index.
    fn save_objects(
        &self,
        documents: &[SearchDocument],
    ) -> impl Future<Output = Result<SaveObjectsResponse, AlgoliaError>> + Send;
}
