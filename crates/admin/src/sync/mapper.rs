//! ERP rows to catalog products.
//!
//! The product/inventory join yields one row per (item, location). Rows are
//! grouped by item id and each group maps to one [`ImportedProduct`].

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use tradepost_core::{Handle, ImportedProduct, InventoryQuantity, ProductFields};

use crate::netsuite::ExternalProductRow;

/// Metadata key holding the ERP item id.
pub const NETSUITE_ID_KEY: &str = "netsuite_id";
/// Metadata key holding the time of the sync that last wrote the product.
pub const SYNCED_AT_KEY: &str = "synced_at";

/// Group rows by item id, keeping the order in which ids first appear.
///
/// Rows without an item id cannot be joined to the catalog and are dropped.
#[must_use]
pub fn group_rows(rows: Vec<ExternalProductRow>) -> Vec<Vec<ExternalProductRow>> {
    let mut groups: Vec<Vec<ExternalProductRow>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(item_id) = row.item_id.clone() else {
            warn!(?row, "Skipping ERP row without item id");
            continue;
        };

        if let Some(group) = positions.get(&item_id).and_then(|&i| groups.get_mut(i)) {
            group.push(row);
            continue;
        }

        positions.insert(item_id, groups.len());
        groups.push(vec![row]);
    }

    groups
}

/// Map the rows of one item, stamping the current time as `synced_at`.
#[must_use]
pub fn map_rows(rows: &[ExternalProductRow]) -> Option<ImportedProduct> {
    map_rows_at(rows, Utc::now())
}

/// Map the rows of one item.
///
/// Scalar fields come from the first row; every row contributes one
/// inventory entry. Returns `None` for an empty group or one whose first row
/// has no item id.
#[must_use]
pub fn map_rows_at(
    rows: &[ExternalProductRow],
    synced_at: DateTime<Utc>,
) -> Option<ImportedProduct> {
    let first = rows.first()?;
    let external_id = first.item_id.clone()?;

    let title = first
        .display_name
        .clone()
        .or_else(|| first.item_name.clone())
        .unwrap_or_else(|| external_id.clone());

    let handle = first
        .item_name
        .as_deref()
        .and_then(Handle::slugify)
        .or_else(|| Handle::slugify(&format!("netsuite-{external_id}")))
        .map_or_else(|| format!("netsuite-{external_id}"), Handle::into_inner);

    let mut metadata = Map::new();
    metadata.insert(NETSUITE_ID_KEY.to_string(), Value::String(external_id.clone()));
    metadata.insert(
        SYNCED_AT_KEY.to_string(),
        Value::String(synced_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );

    let inventory = rows
        .iter()
        .map(|row| InventoryQuantity {
            location: row.location.clone(),
            quantity: row.quantity(),
        })
        .collect();

    Some(ImportedProduct {
        product: ProductFields {
            title,
            handle,
            metadata,
        },
        external_id,
        inventory,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(item_id: &str, location: &str, quantity: &str) -> ExternalProductRow {
        ExternalProductRow {
            item_id: Some(item_id.to_string()),
            item_name: Some(format!("ITEM {item_id}")),
            display_name: Some(format!("Item {item_id}")),
            location: Some(location.to_string()),
            quantity_on_hand: Some(quantity.to_string()),
        }
    }

    #[test]
    fn test_group_rows_preserves_first_seen_order() {
        let rows = vec![
            row("2", "A", "1"),
            row("1", "A", "1"),
            row("2", "B", "1"),
            row("3", "A", "1"),
            row("1", "B", "1"),
        ];

        let groups = group_rows(rows);
        let keys: Vec<_> = groups
            .iter()
            .map(|g| g.first().unwrap().item_id.clone().unwrap())
            .collect();
        let sizes: Vec<_> = groups.iter().map(Vec::len).collect();

        assert_eq!(keys, vec!["2", "1", "3"]);
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_group_rows_drops_rows_without_id() {
        let mut orphan = row("9", "A", "1");
        orphan.item_id = None;

        let groups = group_rows(vec![orphan, row("1", "A", "1")]);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_map_rows_fields() {
        let synced_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let product = map_rows_at(&[row("1", "A", "5"), row("1", "B", "x")], synced_at).unwrap();

        assert_eq!(product.external_id, "1");
        assert_eq!(product.product.title, "Item 1");
        assert_eq!(product.product.handle, "item-1");
        assert_eq!(product.product.metadata[NETSUITE_ID_KEY], "1");
        assert_eq!(product.product.metadata[SYNCED_AT_KEY], "2025-06-01T12:00:00Z");
        assert_eq!(
            product.inventory,
            vec![InventoryQuantity::at("A", 5), InventoryQuantity::at("B", 0)]
        );
    }

    #[test]
    fn test_map_rows_fallbacks() {
        let bare = ExternalProductRow {
            item_id: Some("77".to_string()),
            ..Default::default()
        };
        let product = map_rows(&[bare]).unwrap();

        assert_eq!(product.product.title, "77");
        assert_eq!(product.product.handle, "netsuite-77");
        assert_eq!(product.inventory, vec![InventoryQuantity { location: None, quantity: 0 }]);
    }

    #[test]
    fn test_map_rows_empty_group() {
        assert!(map_rows(&[]).is_none());
    }

    #[test]
    fn test_map_rows_is_idempotent_apart_from_timestamp() {
        let rows = vec![row("1", "A", "5"), row("1", "B", "3")];
        let mut a = map_rows(&rows).unwrap();
        let mut b = map_rows(&rows).unwrap();
        a.product.metadata.remove(SYNCED_AT_KEY);
        b.product.metadata.remove(SYNCED_AT_KEY);

        assert_eq!(a, b);
    }
}
