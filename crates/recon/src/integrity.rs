use std::collections::{BTreeSet, HashMap};

use crate::model::{DuplicateSerialGroup, InventoryRecord};

/// Banner text shown after a clean load.
pub const NO_DOUBLE_BOOKINGS: &str = "NO DOUBLE BOOKINGS DETECTED";

/// Find serial numbers booked against more than one distinct stock id.
///
/// Records with an absent or blank serial are ignored. Groups come back in
/// order of the serial's first appearance.
pub fn find_duplicate_serials(records: &[InventoryRecord]) -> Vec<DuplicateSerialGroup> {
    let mut order: Vec<DuplicateSerialGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let Some(serial) = record.serial.as_deref().map(str::trim) else {
            continue;
        };
        if serial.is_empty() || record.stock_id.is_empty() {
            continue;
        }

        let slot = *index.entry(serial).or_insert_with(|| {
            order.push(DuplicateSerialGroup {
                serial: serial.to_string(),
                stock_ids: BTreeSet::new(),
                make: record.make.clone(),
                model: record.model.clone(),
            });
            order.len() - 1
        });
        order[slot].stock_ids.insert(record.stock_id.clone());
    }

    order.retain(|g| g.stock_ids.len() > 1);
    order
}

/// One line per group, or the all-clear banner.
pub fn describe(groups: &[DuplicateSerialGroup]) -> Vec<String> {
    if groups.is_empty() {
        return vec![NO_DOUBLE_BOOKINGS.to_string()];
    }
    groups.iter().map(|g| format!("DOUBLE BOOKING: {g}")).collect()
}
