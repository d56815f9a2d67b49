//! Integration test support for Tradepost.
//!
//! The sync workflows only see the ERP, the catalog, inventory and the search
//! index through traits, so the tests in `tests/` drive them end to end with
//! the in-memory fakes below. Nothing here needs a database or network.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tradepost-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::{Map, Value, json};

use tradepost_admin::algolia::{AlgoliaError, SaveObjectsResponse, SearchDocument, SearchIndex};
use tradepost_admin::catalog::{
    Catalog, CatalogError, CatalogProduct, ExistingProduct, HandleOwner, InventoryStore,
    NewProduct, ProductPage, ProductUpdate,
};
use tradepost_admin::netsuite::{ErpQuery, QueryOutcome, SuiteQlPage};
use tradepost_core::{ProductId, ProductStatus};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// ERP
// =============================================================================

/// One `SuiteQL` row in the shape the product/inventory statement returns.
#[must_use]
pub fn row(item_id: &str, item_name: &str, location: Option<&str>, quantity: &str) -> Value {
    json!({
        "item_id": item_id,
        "item_name": item_name,
        "display_name": null,
        "location": location,
        "quantity_on_hand": quantity,
    })
}

/// An ERP that answers every statement with the same outcome.
pub struct FakeErp {
    outcome: QueryOutcome,
    statements: Mutex<Vec<String>>,
}

impl FakeErp {
    /// Successful outcome carrying `rows`.
    #[must_use]
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let count = u64::try_from(rows.len()).unwrap_or(u64::MAX);
        Self::with_outcome(QueryOutcome::ok(SuiteQlPage {
            items: rows,
            count,
            ..SuiteQlPage::default()
        }))
    }

    #[must_use]
    pub const fn with_outcome(outcome: QueryOutcome) -> Self {
        Self {
            outcome,
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Statements received so far.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }
}

impl ErpQuery for FakeErp {
    async fn query(&self, statement: &str) -> QueryOutcome {
        lock(&self.statements).push(statement.to_string());
        self.outcome.clone()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// An in-memory catalog with switchable failures.
///
/// Handles are unique like in `PostgreSQL`: a create batch reusing a handle
/// fails as a whole and writes nothing.
#[derive(Default)]
pub struct MemoryCatalog {
    products: Mutex<Vec<CatalogProduct>>,
    next_id: Mutex<i32>,
    fail_lookup: bool,
    fail_create: bool,
    /// `list_published` fails for these offsets.
    fail_offsets: HashSet<u64>,
    merges: Mutex<Vec<(ProductId, String, Value)>>,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    #[must_use]
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    #[must_use]
    pub fn failing_page_at(mut self, offset: u64) -> Self {
        self.fail_offsets.insert(offset);
        self
    }

    /// Seed `count` published products with ids `1..=count`.
    #[must_use]
    pub fn with_published(self, count: i32) -> Self {
        for n in 1..=count {
            self.insert(
                Some(format!("seed-{n}")),
                format!("Seed {n}"),
                format!("seed-{n}"),
                Map::new(),
                ProductStatus::Published,
            );
        }
        self
    }

    /// Insert a product directly and return its id.
    pub fn insert(
        &self,
        external_id: Option<String>,
        title: String,
        handle: String,
        metadata: Map<String, Value>,
        status: ProductStatus,
    ) -> ProductId {
        let id = {
            let mut next = lock(&self.next_id);
            *next += 1;
            ProductId::new(*next)
        };
        let now = Utc::now();
        lock(&self.products).push(CatalogProduct {
            id,
            external_id,
            title,
            handle,
            description: None,
            thumbnail: None,
            status,
            metadata: Value::Object(metadata),
            created_at: now,
            updated_at: now,
        });
        id
    }

    #[must_use]
    pub fn products(&self) -> Vec<CatalogProduct> {
        lock(&self.products).clone()
    }

    #[must_use]
    pub fn by_external_id(&self, external_id: &str) -> Option<CatalogProduct> {
        lock(&self.products)
            .iter()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned()
    }

    /// Number of `create_products` batches received.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `update_products` batches received.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Every `merge_metadata` call received.
    #[must_use]
    pub fn merges(&self) -> Vec<(ProductId, String, Value)> {
        lock(&self.merges).clone()
    }
}

impl Catalog for MemoryCatalog {
    async fn find_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<ExistingProduct>, CatalogError> {
        if self.fail_lookup {
            return Err(CatalogError::Lookup("connection reset".to_string()));
        }

        Ok(lock(&self.products)
            .iter()
            .filter_map(|p| {
                let external_id = p.external_id.clone()?;
                external_ids.contains(&external_id).then_some(ExistingProduct {
                    id: p.id,
                    external_id,
                })
            })
            .collect())
    }

    async fn find_handle_owners(
        &self,
        handles: &[String],
    ) -> Result<Vec<HandleOwner>, CatalogError> {
        if self.fail_lookup {
            return Err(CatalogError::Lookup("connection reset".to_string()));
        }

        Ok(lock(&self.products)
            .iter()
            .filter(|p| handles.contains(&p.handle))
            .map(|p| HandleOwner {
                handle: p.handle.clone(),
                external_id: p.external_id.clone(),
            })
            .collect())
    }

    async fn create_products(
        &self,
        products: Vec<NewProduct>,
    ) -> Result<Vec<CatalogProduct>, CatalogError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(CatalogError::Write("connection reset".to_string()));
        }

        let mut handles: HashSet<String> = lock(&self.products)
            .iter()
            .map(|p| p.handle.clone())
            .collect();
        if let Some(duplicate) = products
            .iter()
            .find(|p| !handles.insert(p.fields.handle.clone()))
        {
            return Err(CatalogError::Write(format!(
                "duplicate handle {}",
                duplicate.fields.handle
            )));
        }

        let ids: Vec<ProductId> = products
            .into_iter()
            .map(|p| {
                let status = p.status();
                self.insert(
                    Some(p.external_id),
                    p.fields.title,
                    p.fields.handle,
                    p.fields.metadata,
                    status,
                )
            })
            .collect();

        Ok(lock(&self.products)
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn update_products(
        &self,
        updates: Vec<ProductUpdate>,
    ) -> Result<Vec<CatalogProduct>, CatalogError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut products = lock(&self.products);
        let mut updated = Vec::new();

        for update in updates {
            let Some(product) = products.iter_mut().find(|p| p.id == update.id) else {
                continue;
            };
            product.title = update.fields.title;
            product.handle = update.fields.handle;
            product.status = update.status;
            product.external_id = Some(update.external_id);
            if let Value::Object(existing) = &mut product.metadata {
                existing.extend(update.fields.metadata);
            }
            product.updated_at = Utc::now();
            updated.push(product.clone());
        }

        Ok(updated)
    }

    async fn list_published(&self, limit: u32, offset: u64) -> Result<ProductPage, CatalogError> {
        if self.fail_offsets.contains(&offset) {
            return Err(CatalogError::Lookup(format!("page at {offset} unavailable")));
        }

        let mut published: Vec<CatalogProduct> = lock(&self.products)
            .iter()
            .filter(|p| p.status == ProductStatus::Published)
            .cloned()
            .collect();
        published.sort_by_key(|p| p.id.as_i32());

        let count = u64::try_from(published.len()).unwrap_or(u64::MAX);
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(ProductPage {
            products: published.into_iter().skip(skip).take(take).collect(),
            count,
        })
    }

    async fn merge_metadata(
        &self,
        id: ProductId,
        key: &str,
        value: Value,
    ) -> Result<(), CatalogError> {
        lock(&self.merges).push((id, key.to_string(), value.clone()));

        let mut products = lock(&self.products);
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Err(CatalogError::Write(format!("no product {id}")));
        };
        let Value::Object(metadata) = &mut product.metadata else {
            return Err(CatalogError::Write("metadata is not an object".to_string()));
        };

        let slot = metadata
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match (slot, value) {
            (Value::Object(existing), Value::Object(incoming)) => existing.extend(incoming),
            (slot, value) => *slot = value,
        }
        Ok(())
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Structured inventory levels, optionally unavailable or failing per location.
#[derive(Default)]
pub struct FakeInventory {
    unavailable: bool,
    failing_locations: HashSet<String>,
    writes: Mutex<Vec<(ProductId, String, i64)>>,
}

impl FakeInventory {
    #[must_use]
    pub fn available() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_at(mut self, location: &str) -> Self {
        self.failing_locations.insert(location.to_string());
        self
    }

    #[must_use]
    pub fn writes(&self) -> Vec<(ProductId, String, i64)> {
        lock(&self.writes).clone()
    }
}

impl InventoryStore for FakeInventory {
    async fn probe(&self) -> bool {
        !self.unavailable
    }

    async fn set_inventory(
        &self,
        id: ProductId,
        location: &str,
        quantity: i64,
    ) -> Result<(), CatalogError> {
        if self.failing_locations.contains(location) {
            return Err(CatalogError::Inventory(format!("location {location} locked")));
        }

        let mut writes = lock(&self.writes);
        writes.retain(|(pid, loc, _)| !(*pid == id && loc == location));
        writes.push((id, location.to_string(), quantity));
        Ok(())
    }
}

// =============================================================================
// Search index
// =============================================================================

/// Records every batch pushed; fails the calls whose index is listed.
#[derive(Default)]
pub struct FakeIndex {
    failing_calls: HashSet<usize>,
    calls: Mutex<Vec<Vec<SearchDocument>>>,
}

impl FakeIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call`-th push (0-based).
    #[must_use]
    pub fn failing_call(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Vec<SearchDocument>> {
        lock(&self.calls).clone()
    }
}

impl SearchIndex for FakeIndex {
    async fn save_objects(
        &self,
        documents: &[SearchDocument],
    ) -> Result<SaveObjectsResponse, AlgoliaError> {
        let mut calls = lock(&self.calls);
        let call = calls.len();
        calls.push(documents.to_vec());

        if self.failing_calls.contains(&call) {
            return Err(AlgoliaError::Api {
                status: 500,
                message: "Internal error".to_string(),
            });
        }

        Ok(SaveObjectsResponse {
            task_id: u64::try_from(call).unwrap_or_default() + 1,
            object_ids: documents.iter().map(|d| d.object_id.clone()).collect(),
        })
    }
}
