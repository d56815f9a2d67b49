//! Summary values reported by sync workflows.

use serde::{Deserialize, Serialize};

/// Terminal summary of one product sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Products created in the catalog.
    pub created_count: usize,
    /// Existing products updated in the catalog.
    pub updated_count: usize,
    /// Inventory levels written through the inventory store.
    pub inventory_upserts: usize,
    /// Inventory levels written into product metadata instead.
    pub metadata_fallbacks: usize,
    /// `created_count + updated_count`.
    pub total_processed: usize,
}

impl SyncResult {
    /// The result of a run that had nothing to do.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            created_count: 0,
            updated_count: 0,
            inventory_upserts: 0,
            metadata_fallbacks: 0,
            total_processed: 0,
        }
    }
}
