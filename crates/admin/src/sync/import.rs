//! Import step: run the product/inventory statement and map its rows.
//!
//! `SuiteQL` returns the result set in one response (up to its cap, flagged
//! by `hasMore`), so paging is applied here. Rows are grouped into products first and `offset`/`limit`
//! then count products, never rows: a product's location rows always land on
//! the same page.

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use tradepost_core::ImportedProduct;

use super::mapper::{group_rows, map_rows};
use crate::netsuite::{ErpQuery, queries};

/// Products per manual sync when the request names no limit.
pub const DEFAULT_IMPORT_LIMIT: usize = 10;

/// Which slice of the ERP's products to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportRequest {
    /// Maximum products to import (0 = all).
    pub limit: usize,
    /// Products to skip, counted after grouping.
    pub offset: usize,
}

impl Default for ImportRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_IMPORT_LIMIT,
            offset: 0,
        }
    }
}

/// Products imported by one run of the import step.
///
/// A failed query yields no products. `error` keeps that case apart from an
/// ERP that genuinely returned nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    pub products: Vec<ImportedProduct>,
    /// Products the ERP returned before paging.
    pub available: usize,
    /// The ERP cut the result set short, so products past its cap are missing.
    pub truncated: bool,
    pub error: Option<String>,
}

impl ImportBatch {
    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Run the import step.
#[instrument(skip(erp))]
pub async fn import_products<E: ErpQuery>(erp: &E, request: ImportRequest) -> ImportBatch {
    let outcome = erp.query(queries::PRODUCT_INVENTORY).await;

    let page = match (outcome.success, outcome.data) {
        (true, Some(page)) => page,
        _ => {
            let message = outcome
                .error
                .unwrap_or_else(|| "No data returned".to_string());
            error!(error = %message, "ERP product query failed, importing nothing");
            return ImportBatch::failed(message);
        }
    };

    if page.has_more {
        warn!(
            returned = page.count,
            total = ?page.total_results,
            "ERP result set truncated, products past the cap are not imported"
        );
    }

    let rows = match page.product_rows() {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "ERP returned rows that are not objects, importing nothing");
            return ImportBatch::failed(format!("Malformed ERP rows: {e}"));
        }
    };

    let row_count = rows.len();
    let groups = group_rows(rows);
    let available = groups.len();
    let limit = if request.limit == 0 {
        usize::MAX
    } else {
        request.limit
    };

    let products: Vec<ImportedProduct> = groups
        .iter()
        .skip(request.offset)
        .take(limit)
        .filter_map(|group| map_rows(group))
        .collect();

    info!(
        rows = row_count,
        available,
        imported = products.len(),
        "Imported products from ERP"
    );

    ImportBatch {
        products,
        available,
        truncated: page.has_more,
        error: None,
    }
}
