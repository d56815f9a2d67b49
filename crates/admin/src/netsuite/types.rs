//! `SuiteQL` wire types.

use serde::{Deserialize, Deserializer, Serialize};

/// One page of `SuiteQL` results as returned by `POST /query/v1/suiteql`.
///
/// Our statements are sent without caller-side paging. `NetSuite` still caps
/// one response, and `has_more` marks a result set cut off at that cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteQlPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u64>,
}

impl SuiteQlPage {
    /// Decode every item as an [`ExternalProductRow`].
    ///
    /// # Errors
    ///
    /// Returns the first decoding error. Individual fields are lenient, so
    /// this only fails when an item is not a JSON object.
    pub fn product_rows(&self) -> Result<Vec<ExternalProductRow>, serde_json::Error> {
        self.items
            .iter()
            .map(|item| serde_json::from_value(item.clone()))
            .collect()
    }
}

/// Result of one `SuiteQL` statement.
///
/// Failures never propagate out of the adapter; they collapse into
/// `success: false` with a message taken from the upstream body when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SuiteQlPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw upstream error body, when one was returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl QueryOutcome {
    #[must_use]
    pub const fn ok(page: SuiteQlPage) -> Self {
        Self {
            success: true,
            data: Some(page),
            error: None,
            details: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// One row of the product/inventory join.
///
/// `SuiteQL` returns numbers as strings for some column types and as JSON
/// numbers for others, so every column decodes leniently into a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProductRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity_on_hand: Option<String>,
}

impl ExternalProductRow {
    /// Quantity on hand as a whole number; anything non-numeric counts as 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // saturating cast, fractions dropped
    pub fn quantity(&self) -> i64 {
        let Some(raw) = self.quantity_on_hand.as_deref().map(str::trim) else {
            return 0;
        };

        if let Ok(whole) = raw.parse::<i64>() {
            return whole;
        }

        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => value.trunc() as i64,
            _ => 0,
        }
    }
}

/// Accept a string, number or bool; map null and empty strings to `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
