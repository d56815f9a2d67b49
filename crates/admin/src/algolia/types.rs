//! Algolia REST wire types.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogProduct;

/// A product as stored in the search index.
///
/// `objectID` is the catalog product id, so re-indexing replaces the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl From<&CatalogProduct> for SearchDocument {
    fn from(product: &CatalogProduct) -> Self {
        let id = product.id.to_string();
        Self {
            object_id: id.clone(),
            id,
            title: product.title.clone(),
            handle: product.handle.clone(),
            description: product.description.clone(),
            thumbnail: product.thumbnail.clone(),
        }
    }
}

/// Body of `POST /1/indexes/{index}/batch`.
#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    pub requests: Vec<BatchOperation<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchOperation<'a> {
    pub action: &'static str,
    pub body: &'a SearchDocument,
}

/// Response of a batch write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveObjectsResponse {
    #[serde(rename = "taskID", default)]
    pub task_id: u64,
    #[serde(rename = "objectIDs", default)]
    pub object_ids: Vec<String>,
}

/// Body of `POST /1/indexes/*/queries`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MultiQueryRequest<'a> {
    pub requests: Vec<IndexQuery<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndexQuery<'a> {
    pub index_name: &'a str,
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a str>,
}

/// Response of a multi-index query.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Hits for one index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResult {
    #[serde(default)]
    pub nb_hits: u64,
}

/// Error body returned by the Algolia API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use tradepost_core::{ProductId, ProductStatus};

    use super::*;

    #[test]
    fn test_document_uses_product_id_as_object_id() {
        let product = CatalogProduct {
            id: ProductId::new(17),
            external_id: Some("1".to_string()),
            title: "Widget".to_string(),
            handle: "widget".to_string(),
            description: None,
            thumbnail: Some("https://cdn.example.com/w.png".to_string()),
            status: ProductStatus::Published,
            metadata: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(SearchDocument::from(&product)).unwrap();

        assert_eq!(
            value,
            json!({
                "objectID": "17",
                "id": "17",
                "title": "Widget",
                "handle": "widget",
                "thumbnail": "https://cdn.example.com/w.png"
            })
        );
    }

    #[test]
    fn test_search_response_decodes() {
        let response: SearchResponse = serde_json::from_value(json!({
            "results": [{ "hits": [], "nbHits": 0, "page": 0, "index": "products", "processingTimeMS": 1 }]
        }))
        .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results.first().unwrap().nb_hits, 0);
    }
}
