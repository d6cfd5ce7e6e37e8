use super::{InventoryRecord, Units, WasteCounters, WasteHistoryEvent};

/// Keep only records carrying waste, ordered by their own total waste
/// (largest first, ties broken by SKU).
pub fn wasted_items(records: Vec<InventoryRecord>) -> Vec<InventoryRecord> {
    let mut items: Vec<InventoryRecord> = records.into_iter().filter(|r| r.has_waste()).collect();
    items.sort_by(|a, b| {
        b.foul_water
            .total_waste
            .cmp(&a.foul_water.total_waste)
            .then_with(|| a.sku.cmp(&b.sku))
    });
    items
}

/// Sum the waste counters of a set of records.
pub fn sum_counters<'a>(records: impl IntoIterator<Item = &'a InventoryRecord>) -> WasteCounters {
    records.into_iter().map(|r| r.foul_water).sum()
}

/// Average waste per wasted item, times 100, rounded to two decimals.
///
/// Not a share of inventory: the denominator is the number of items that
/// carry waste. Zero when there are none.
pub fn waste_percentage(total_waste: Units, item_count: usize) -> f64 {
    if item_count == 0 {
        return 0.0;
    }
    let raw = (total_waste as f64 / item_count as f64) * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Findings of a ledger consistency scan.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub warehouse_records: usize,
    pub branch_records: usize,
    pub history_events: usize,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check the stored invariants of inventory records and history events.
pub fn build_integrity_report(
    warehouse: &[InventoryRecord],
    branches: &[InventoryRecord],
    history: &[WasteHistoryEvent],
) -> IntegrityReport {
    let mut issues = Vec::new();

    for record in warehouse.iter().chain(branches) {
        let label = format!("{} {}", record.location, record.key());
        if !record.foul_water.is_consistent() {
            issues.push(format!(
                "{}: total waste {} does not match category sum {}",
                label,
                record.foul_water.total_waste,
                record.foul_water.category_sum()
            ));
        }
        if record.quantity < 0 {
            issues.push(format!("{}: negative quantity {}", label, record.quantity));
        }
        if let Some(available) = record.available_quantity.filter(|a| *a < 0) {
            issues.push(format!("{}: negative available quantity {}", label, available));
        }
    }

    for event in history {
        if event.quantity <= 0 {
            issues.push(format!(
                "history event {}: non-positive quantity {}",
                event.id, event.quantity
            ));
        }
    }

    IntegrityReport {
        warehouse_records: warehouse.len(),
        branch_records: branches.len(),
        history_events: history.len(),
        issues,
    }
}
