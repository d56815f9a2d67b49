//! Products imported from the ERP, ready to be written to the catalog.

use serde::{Deserialize, Serialize};

/// Quantity on hand at one inventory location.
///
/// `location` is `None` when the ERP reported an item without any inventory
/// balance row; such entries are carried through mapping but never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryQuantity {
    /// ERP location identifier.
    pub location: Option<String>,
    /// Quantity on hand (non-numeric ERP values become 0).
    pub quantity: i64,
}

impl InventoryQuantity {
    /// Create a quantity entry for a known location.
    #[must_use]
    pub fn at(location: impl Into<String>, quantity: i64) -> Self {
        Self {
            location: Some(location.into()),
            quantity,
        }
    }
}

/// Scalar product fields derived from the first ERP row of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    /// Display title.
    pub title: String,
    /// URL-safe handle placeholder.
    pub handle: String,
    /// Unstructured metadata (`netsuite_id`, `synced_at`, ...).
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// One ERP product with its per-location inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedProduct {
    /// Catalog-facing product fields.
    pub product: ProductFields,
    /// Stable join key between the ERP and the catalog.
    pub external_id: String,
    /// One entry per ERP row of this product.
    pub inventory: Vec<InventoryQuantity>,
}
