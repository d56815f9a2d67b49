//! Product catalog seam.
//!
//! The sync pipelines only see the [`Catalog`] and [`InventoryStore`] traits.
//! `PostgreSQL` implements both through [`crate::db::catalog::PgCatalog`];
//! tests drive the pipelines with in-memory fakes.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use tradepost_core::{ProductFields, ProductId, ProductStatus};

/// Option created on every imported product.
pub const DEFAULT_OPTION_TITLE: &str = "Size";
/// The single value of [`DEFAULT_OPTION_TITLE`].
pub const DEFAULT_OPTION_VALUE: &str = "Default";
/// Title of the single variant created on every imported product.
pub const DEFAULT_VARIANT_TITLE: &str = "Default";
/// Placeholder price in minor units until pricing is synced.
pub const DEFAULT_PRICE_AMOUNT: i64 = 1000;
/// Currency of [`DEFAULT_PRICE_AMOUNT`].
pub const DEFAULT_CURRENCY: &str = "usd";

/// Metadata key under which the inventory fallback stores quantities.
pub const INVENTORY_METADATA_KEY: &str = "inventory";

/// Errors raised by catalog implementations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Looking up existing products failed.
    #[error("catalog lookup failed: {0}")]
    Lookup(String),

    /// Creating or updating products failed.
    #[error("catalog write failed: {0}")]
    Write(String),

    /// Writing an inventory level failed.
    #[error("inventory write failed: {0}")]
    Inventory(String),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A catalog product matched by external id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingProduct {
    pub id: ProductId,
    pub external_id: String,
}

/// A catalog product or variant SKU using a handle.
///
/// `external_id` is the owning product's external id, `None` for products
/// created outside the sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleOwner {
    pub handle: String,
    pub external_id: Option<String>,
}

/// A product to create from ERP data.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub fields: ProductFields,
    pub external_id: String,
}

impl NewProduct {
    /// SKU of the default variant: the handle, or `SKU-{external_id}` when
    /// the handle is empty.
    #[must_use]
    pub fn sku(&self) -> String {
        if self.fields.handle.is_empty() {
            format!("SKU-{}", self.external_id)
        } else {
            self.fields.handle.clone()
        }
    }

    /// Imported products are always published.
    #[must_use]
    pub const fn status(&self) -> ProductStatus {
        ProductStatus::Published
    }
}

/// An update to an existing product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub id: ProductId,
    pub fields: ProductFields,
    pub external_id: String,
    pub status: ProductStatus,
}

impl ProductUpdate {
    /// Build an update for `id`, forcing the product to `published`.
    #[must_use]
    pub const fn published(id: ProductId, fields: ProductFields, external_id: String) -> Self {
        Self {
            id,
            fields,
            external_id,
            status: ProductStatus::Published,
        }
    }
}

/// A product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub external_id: Option<String>,
    pub title: String,
    pub handle: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub status: ProductStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of published products plus the total published count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<CatalogProduct>,
    pub count: u64,
}

/// Quantities keyed by location, as stored under [`INVENTORY_METADATA_KEY`].
pub type LocationQuantities = BTreeMap<String, i64>;

/// Product persistence used by the sync pipelines.
pub trait Catalog: Send + Sync {
    /// Products whose external id is one of `external_ids`.
    fn find_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> impl Future<Output = Result<Vec<ExistingProduct>, CatalogError>> + Send;

    /// Products and variant SKUs already using one of `handles`.
    fn find_handle_owners(
        &self,
        handles: &[String],
    ) -> impl Future<Output = Result<Vec<HandleOwner>, CatalogError>> + Send;

    /// Create all products in one batch.
    ///
    /// Each product gets the default option, variant and price.
    fn create_products(
        &self,
        products: Vec<NewProduct>,
    ) -> impl Future<Output = Result<Vec<CatalogProduct>, CatalogError>> + Send;

    /// Apply all updates in one batch.
    fn update_products(
        &self,
        updates: Vec<ProductUpdate>,
    ) -> impl Future<Output = Result<Vec<CatalogProduct>, CatalogError>> + Send;

    /// Published products ordered by id.
    fn list_published(
        &self,
        limit: u32,
        offset: u64,
    ) -> impl Future<Output = Result<ProductPage, CatalogError>> + Send;

    /// Merge `value`'s entries into the JSON object stored at `metadata[key]`.
    fn merge_metadata(
        &self,
        id: ProductId,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;
}

/// Structured per-location inventory.
pub trait InventoryStore: Send + Sync {
    /// Whether structured inventory is available at all.
    fn probe(&self) -> impl Future<Output = bool> + Send;

    /// Set the on-hand quantity of `id` at `location`.
    fn set_inventory(
        &self,
        id: ProductId,
        location: &str,
        quantity: i64,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;
}
