//! `PostgreSQL` catalog store.
//!
//! Implements [`Catalog`] and [`InventoryStore`] over the `catalog` schema.
//! Batch writes run in a single transaction, so a failed batch leaves no
//! partial products behind.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{instrument, warn};

use tradepost_core::{ProductId, ProductStatus};

use crate::catalog::{
    Catalog, CatalogError, CatalogProduct, DEFAULT_CURRENCY, DEFAULT_OPTION_TITLE,
    DEFAULT_OPTION_VALUE, DEFAULT_PRICE_AMOUNT, DEFAULT_VARIANT_TITLE, ExistingProduct,
    HandleOwner, InventoryStore, NewProduct, ProductPage, ProductUpdate,
};

const PRODUCT_COLUMNS: &str = "id, external_id, title, handle, description, thumbnail, \
     status, metadata, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    external_id: Option<String>,
    title: String,
    handle: String,
    description: Option<String>,
    thumbnail: Option<String>,
    status: ProductStatus,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for CatalogProduct {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            external_id: row.external_id,
            title: row.title,
            handle: row.handle,
            description: row.description,
            thumbnail: row.thumbnail,
            status: row.status,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExistingRow {
    id: i32,
    external_id: String,
}

#[derive(Debug, sqlx::FromRow)]
struct HandleOwnerRow {
    handle: String,
    external_id: Option<String>,
}

// =============================================================================
// Store
// =============================================================================

/// Catalog store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn write_error(e: sqlx::Error) -> CatalogError {
    CatalogError::Write(e.to_string())
}

fn to_i64(value: u64, what: &str) -> Result<i64, CatalogError> {
    i64::try_from(value).map_err(|_| CatalogError::Lookup(format!("{what} out of range: {value}")))
}

impl Catalog for PgCatalog {
    #[instrument(skip(self, external_ids), fields(count = external_ids.len()))]
    async fn find_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<ExistingProduct>, CatalogError> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<ExistingRow> = sqlx::query_as(
            r"
            SELECT id, external_id
            FROM catalog.products
            WHERE external_id = ANY($1)
            ",
        )
        .bind(external_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Lookup(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ExistingProduct {
                id: ProductId::new(row.id),
                external_id: row.external_id,
            })
            .collect())
    }

    #[instrument(skip(self, handles), fields(count = handles.len()))]
    async fn find_handle_owners(
        &self,
        handles: &[String],
    ) -> Result<Vec<HandleOwner>, CatalogError> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        // Variant SKUs default to the handle, so both columns are checked.
        let rows: Vec<HandleOwnerRow> = sqlx::query_as(
            r"
            SELECT handle, external_id
            FROM catalog.products
            WHERE handle = ANY($1)
            UNION
            SELECT v.sku AS handle, p.external_id
            FROM catalog.product_variants v
            JOIN catalog.products p ON p.id = v.product_id
            WHERE v.sku = ANY($1)
            ",
        )
        .bind(handles)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Lookup(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| HandleOwner {
                handle: row.handle,
                external_id: row.external_id,
            })
            .collect())
    }

    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn create_products(
        &self,
        products: Vec<NewProduct>,
    ) -> Result<Vec<CatalogProduct>, CatalogError> {
        let mut tx = self.pool.begin().await.map_err(write_error)?;
        let mut created = Vec::with_capacity(products.len());

        for product in products {
            let sku = product.sku();
            let row: ProductRow = sqlx::query_as(&format!(
                r"
                INSERT INTO catalog.products (external_id, title, handle, status, metadata)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {PRODUCT_COLUMNS}
                "
            ))
            .bind(&product.external_id)
            .bind(&product.fields.title)
            .bind(&product.fields.handle)
            .bind(product.status())
            .bind(serde_json::Value::Object(product.fields.metadata))
            .fetch_one(&mut *tx)
            .await
            .map_err(write_error)?;

            sqlx::query(
                r"
                INSERT INTO catalog.product_options (product_id, title, values)
                VALUES ($1, $2, ARRAY[$3])
                ",
            )
            .bind(row.id)
            .bind(DEFAULT_OPTION_TITLE)
            .bind(DEFAULT_OPTION_VALUE)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

            sqlx::query(
                r"
                INSERT INTO catalog.product_variants
                    (product_id, title, sku, options, manage_inventory, price_amount, currency_code)
                VALUES ($1, $2, $3, $4, TRUE, $5, $6)
                ",
            )
            .bind(row.id)
            .bind(DEFAULT_VARIANT_TITLE)
            .bind(sku)
            .bind(serde_json::json!({ DEFAULT_OPTION_TITLE: DEFAULT_OPTION_VALUE }))
            .bind(DEFAULT_PRICE_AMOUNT)
            .bind(DEFAULT_CURRENCY)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

            created.push(CatalogProduct::from(row));
        }

        tx.commit().await.map_err(write_error)?;
        Ok(created)
    }

    #[instrument(skip(self, updates), fields(count = updates.len()))]
    async fn update_products(
        &self,
        updates: Vec<ProductUpdate>,
    ) -> Result<Vec<CatalogProduct>, CatalogError> {
        let mut tx = self.pool.begin().await.map_err(write_error)?;
        let mut updated = Vec::with_capacity(updates.len());

        for update in updates {
            let row: Option<ProductRow> = sqlx::query_as(&format!(
                r"
                UPDATE catalog.products
                SET title = $2,
                    handle = $3,
                    external_id = $4,
                    status = $5,
                    metadata = metadata || $6,
                    updated_at = now()
                WHERE id = $1
                RETURNING {PRODUCT_COLUMNS}
                "
            ))
            .bind(update.id)
            .bind(&update.fields.title)
            .bind(&update.fields.handle)
            .bind(&update.external_id)
            .bind(update.status)
            .bind(serde_json::Value::Object(update.fields.metadata))
            .fetch_optional(&mut *tx)
            .await
            .map_err(write_error)?;

            let row = row
                .ok_or_else(|| CatalogError::Write(format!("product {} not found", update.id)))?;
            updated.push(CatalogProduct::from(row));
        }

        tx.commit().await.map_err(write_error)?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn list_published(&self, limit: u32, offset: u64) -> Result<ProductPage, CatalogError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM catalog.products WHERE status = 'published'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogError::Lookup(e.to_string()))?;

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM catalog.products
            WHERE status = 'published'
            ORDER BY id
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(i64::from(limit))
        .bind(to_i64(offset, "offset")?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Lookup(e.to_string()))?;

        Ok(ProductPage {
            products: rows.into_iter().map(CatalogProduct::from).collect(),
            count: u64::try_from(count).unwrap_or_default(),
        })
    }

    #[instrument(skip(self, value))]
    async fn merge_metadata(
        &self,
        id: ProductId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), CatalogError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.products
            SET metadata = jsonb_set(
                    metadata,
                    ARRAY[$2::text],
                    CASE WHEN jsonb_typeof(metadata -> $2) = 'object'
                         THEN metadata -> $2
                         ELSE '{}'::jsonb
                    END || $3,
                    true
                ),
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::Write(format!("product {id} not found")));
        }
        Ok(())
    }
}

impl InventoryStore for PgCatalog {
    async fn probe(&self) -> bool {
        let available: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT to_regclass('catalog.inventory_levels') IS NOT NULL")
                .fetch_one(&self.pool)
                .await;

        available.unwrap_or_else(|e| {
            warn!(error = %e, "Inventory capability probe failed");
            false
        })
    }

    #[instrument(skip(self))]
    async fn set_inventory(
        &self,
        id: ProductId,
        location: &str,
        quantity: i64,
    ) -> Result<(), CatalogError> {
        sqlx::query(
            r"
            INSERT INTO catalog.inventory_levels (product_id, location, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, location)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = now()
            ",
        )
        .bind(id)
        .bind(location)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::Inventory(e.to_string()))?;

        Ok(())
    }
}
