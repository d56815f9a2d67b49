//! Product sync workflow: import from the ERP, then upsert into the catalog.

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument};

use tradepost_core::SyncResult;

use super::import::{ImportRequest, import_products};
use super::upsert::{InventoryTarget, upsert_products};
use crate::catalog::{Catalog, CatalogError, InventoryStore};
use crate::netsuite::ErpQuery;

/// Name under which product sync runs are recorded.
pub const PRODUCT_SYNC_WORKFLOW: &str = "netsuite-sync-products";

/// Stages of one product sync run.
///
/// There is no error stage: a failing step ends the run with `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Importing,
    Upserting,
    Done,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Importing => write!(f, "importing"),
            Self::Upserting => write!(f, "upserting"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Outcome of a completed product sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSyncReport {
    #[serde(flatten)]
    pub result: SyncResult,
    /// Products the ERP offered before paging.
    pub available: usize,
    /// The ERP cut its result set short; see [`super::ImportBatch::truncated`].
    pub truncated: bool,
    /// Set when the ERP query failed and nothing was imported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_error: Option<String>,
}

impl ProductSyncReport {
    /// `false` when the import step could not read from the ERP.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.import_error.is_none()
    }
}

/// Sequences the import and upsert steps over borrowed collaborators.
pub struct ProductSyncWorkflow<'a, E, C, S> {
    erp: &'a E,
    catalog: &'a C,
    inventory: &'a S,
}

impl<'a, E, C, S> ProductSyncWorkflow<'a, E, C, S>
where
    E: ErpQuery,
    C: Catalog,
    S: InventoryStore,
{
    #[must_use]
    pub const fn new(erp: &'a E, catalog: &'a C, inventory: &'a S) -> Self {
        Self {
            erp,
            catalog,
            inventory,
        }
    }

    /// Run one sync.
    ///
    /// # Errors
    ///
    /// Returns the `CatalogError` of a failed create or update batch.
    #[instrument(skip(self), fields(workflow = PRODUCT_SYNC_WORKFLOW))]
    pub async fn run(&self, request: ImportRequest) -> Result<ProductSyncReport, CatalogError> {
        info!(stage = %SyncStage::Importing, "Product sync stage");
        let batch = import_products(self.erp, request).await;

        info!(stage = %SyncStage::Upserting, products = batch.products.len(), "Product sync stage");
        let target = InventoryTarget::resolve(self.inventory).await;
        let result = upsert_products(self.catalog, target, batch.products).await?;

        info!(
            stage = %SyncStage::Done,
            created = result.created_count,
            updated = result.updated_count,
            total = result.total_processed,
            "Product sync stage"
        );

        Ok(ProductSyncReport {
            result,
            available: batch.available,
            truncated: batch.truncated,
            import_error: batch.error,
        })
    }
}
