//! Upsert step: create or update imported products, then write inventory.

use std::collections::{HashMap, HashSet};

use tracing::{info, instrument, warn};

use tradepost_core::{Handle, ImportedProduct, InventoryQuantity, ProductId, SyncResult};

use crate::catalog::{
    Catalog, CatalogError, INVENTORY_METADATA_KEY, InventoryStore, LocationQuantities, NewProduct,
    ProductUpdate,
};

/// Where inventory quantities are written for one run.
///
/// Chosen once per run by [`InventoryTarget::resolve`], never per record.
#[derive(Debug)]
pub enum InventoryTarget<'a, S> {
    /// Per-location inventory levels.
    Structured(&'a S),
    /// `metadata.inventory[location] = quantity` on the product itself.
    MetadataFallback,
}

impl<S> Clone for InventoryTarget<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for InventoryTarget<'_, S> {}

impl<'a, S: InventoryStore> InventoryTarget<'a, S> {
    /// Probe `store` and pick the target for this run.
    pub async fn resolve(store: &'a S) -> Self {
        if store.probe().await {
            Self::Structured(store)
        } else {
            warn!("Structured inventory unavailable, storing quantities in product metadata");
            Self::MetadataFallback
        }
    }

    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// Run the upsert step.
///
/// Handles already used by another product are renamed first. Lookup failures
/// are not fatal: the batch is treated as entirely new. Create and update
/// failures abort the step.
///
/// # Errors
///
/// Returns the `CatalogError` of a failed create or update batch. Products
/// written by an earlier batch in the same call are not rolled back.
#[instrument(skip(catalog, target, products), fields(count = products.len()))]
pub async fn upsert_products<C, S>(
    catalog: &C,
    target: InventoryTarget<'_, S>,
    mut products: Vec<ImportedProduct>,
) -> Result<SyncResult, CatalogError>
where
    C: Catalog,
    S: InventoryStore,
{
    let mut result = SyncResult::empty();
    if products.is_empty() {
        return Ok(result);
    }

    dedupe_handles(catalog, &mut products).await;

    let external_ids: Vec<String> = products.iter().map(|p| p.external_id.clone()).collect();
    let existing: HashMap<String, ProductId> =
        match catalog.find_by_external_ids(&external_ids).await {
            Ok(found) => found.into_iter().map(|p| (p.external_id, p.id)).collect(),
            Err(e) => {
                warn!(error = %e, "Existing product lookup failed, treating all products as new");
                HashMap::new()
            }
        };

    let mut to_create = Vec::new();
    let mut to_update = Vec::new();
    let mut inventory: HashMap<String, Vec<InventoryQuantity>> = HashMap::new();

    for imported in products {
        inventory.insert(imported.external_id.clone(), imported.inventory);
        match existing.get(&imported.external_id) {
            Some(&id) => to_update.push(ProductUpdate::published(
                id,
                imported.product,
                imported.external_id,
            )),
            None => to_create.push(NewProduct {
                fields: imported.product,
                external_id: imported.external_id,
            }),
        }
    }

    let mut written: Vec<(ProductId, String)> = Vec::new();

    if !to_create.is_empty() {
        let created = catalog.create_products(to_create).await?;
        result.created_count = created.len();
        written.extend(
            created
                .into_iter()
                .filter_map(|p| p.external_id.map(|external_id| (p.id, external_id))),
        );
    }

    if !to_update.is_empty() {
        let ids: Vec<(ProductId, String)> = to_update
            .iter()
            .map(|u| (u.id, u.external_id.clone()))
            .collect();
        let updated = catalog.update_products(to_update).await?;
        result.updated_count = updated.len();
        written.extend(ids);
    }

    for (id, external_id) in written {
        let Some(quantities) = inventory.remove(&external_id) else {
            continue;
        };
        apply_inventory(catalog, target, id, &quantities, &mut result).await;
    }

    result.total_processed = result.created_count + result.updated_count;

    info!(
        created = result.created_count,
        updated = result.updated_count,
        inventory_upserts = result.inventory_upserts,
        metadata_fallbacks = result.metadata_fallbacks,
        "Upserted products"
    );

    Ok(result)
}

/// Rename handles that another product already uses.
///
/// A handle is taken when a catalog product or variant SKU owned by a
/// different external id uses it, or when an earlier product in the batch
/// claimed it. Taken handles get `-{external_id}` appended, then a counter.
/// A failed owner lookup is logged and only in-batch duplicates are renamed.
async fn dedupe_handles<C: Catalog>(catalog: &C, products: &mut [ImportedProduct]) {
    let mut candidates = Vec::with_capacity(products.len() * 2);
    for imported in products.iter() {
        let handle = &imported.product.handle;
        candidates.push(handle.clone());
        candidates.push(suffixed(handle, &imported.external_id));
    }

    let mut owners: HashMap<String, Vec<Option<String>>> = HashMap::new();
    match catalog.find_handle_owners(&candidates).await {
        Ok(found) => {
            for owner in found {
                owners.entry(owner.handle).or_default().push(owner.external_id);
            }
        }
        Err(e) => {
            warn!(error = %e, "Handle owner lookup failed, deduplicating within the batch only");
        }
    }

    let mut claimed: HashSet<String> = HashSet::with_capacity(products.len());
    for imported in products.iter_mut() {
        let external_id = imported.external_id.as_str();
        let original = imported.product.handle.clone();
        let mut handle = original.clone();

        if !is_free(&handle, external_id, &owners, &claimed) {
            handle = suffixed(&original, external_id);
            let mut attempt: u32 = 2;
            while !is_free(&handle, external_id, &owners, &claimed) {
                handle = suffixed(&original, &format!("{external_id}-{attempt}"));
                attempt += 1;
            }
            warn!(external_id, from = %original, to = %handle, "Handle already in use, renamed");
        }

        claimed.insert(handle.clone());
        imported.product.handle = handle;
    }
}

fn is_free(
    handle: &str,
    external_id: &str,
    owners: &HashMap<String, Vec<Option<String>>>,
    claimed: &HashSet<String>,
) -> bool {
    !claimed.contains(handle)
        && owners.get(handle).is_none_or(|owned_by| {
            owned_by
                .iter()
                .all(|owner| owner.as_deref() == Some(external_id))
        })
}

fn suffixed(handle: &str, suffix: &str) -> String {
    Handle::slugify(handle).map_or_else(
        || format!("{handle}-{suffix}"),
        |h| h.with_suffix(suffix).into_inner(),
    )
}

/// Write one product's quantities, falling back to metadata per product.
///
/// Entries without a location are skipped. Inventory is best effort: a
/// failed metadata write is logged and the run continues.
async fn apply_inventory<C, S>(
    catalog: &C,
    target: InventoryTarget<'_, S>,
    id: ProductId,
    quantities: &[InventoryQuantity],
    result: &mut SyncResult,
) where
    C: Catalog,
    S: InventoryStore,
{
    let mut fallback = LocationQuantities::new();

    for entry in quantities {
        let Some(location) = entry.location.as_deref() else {
            continue;
        };

        match target {
            InventoryTarget::Structured(store) => {
                match store.set_inventory(id, location, entry.quantity).await {
                    Ok(()) => result.inventory_upserts += 1,
                    Err(e) => {
                        warn!(product_id = %id, location, error = %e, "Inventory write failed, using metadata");
                        fallback.insert(location.to_string(), entry.quantity);
                    }
                }
            }
            InventoryTarget::MetadataFallback => {
                fallback.insert(location.to_string(), entry.quantity);
            }
        }
    }

    if fallback.is_empty() {
        return;
    }

    let written = fallback.len();
    let value = serde_json::json!(fallback);
    match catalog.merge_metadata(id, INVENTORY_METADATA_KEY, value).await {
        Ok(()) => result.metadata_fallbacks += written,
        Err(e) => warn!(product_id = %id, error = %e, "Metadata inventory write failed"),
    }
}
