//! Fixed `SuiteQL` statements.
//!
//! `SuiteQL` over REST has no server-side paging for these statements, so each
//! one bounds its own result set through its `WHERE` clause.

/// Item types eligible for catalog sync.
pub const SYNCED_ITEM_TYPES: &[&str] = &["InvtPart", "Assembly", "Kit"];

/// Active, sync-flagged items joined with their per-location balances.
///
/// Items without any balance row still appear once with a null location.
pub const PRODUCT_INVENTORY: &str = "\
SELECT item.id AS item_id, item.itemid AS item_name, item.displayname AS display_name, \
inventorybalance.location AS location, inventorybalance.quantityonhand AS quantity_on_hand \
FROM item \
LEFT JOIN inventorybalance ON item.id = inventorybalance.item \
WHERE item.isinactive = 'F' \
AND item.itemtype IN ('InvtPart', 'Assembly', 'Kit') \
AND custitem_connector_flag_field = '1' \
ORDER BY item_id, location";

/// Cheapest statement that still exercises authentication and item access.
pub const CONNECTION_PROBE: &str = "\
SELECT item.id AS item_id FROM item \
WHERE item.isinactive = 'F' AND ROWNUM <= 1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_inventory_filters() {
        assert!(PRODUCT_INVENTORY.contains("item.isinactive = 'F'"));
        assert!(PRODUCT_INVENTORY.contains("custitem_connector_flag_field = '1'"));
        assert!(PRODUCT_INVENTORY.ends_with("ORDER BY item_id, location"));
        for item_type in SYNCED_ITEM_TYPES {
            assert!(PRODUCT_INVENTORY.contains(&format!("'{item_type}'")));
        }
    }

    #[test]
    fn test_statements_are_single_line() {
        assert!(!PRODUCT_INVENTORY.contains('\n'));
        assert!(!CONNECTION_PROBE.contains('\n'));
    }
}
