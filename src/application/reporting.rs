use serde::{Deserialize, Serialize};

use crate::domain::{InventoryRecord, LocationKind, Units, WasteCounters};

/// Per-category waste sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteSummary {
    pub defective: Units,
    pub expired: Units,
    pub damaged: Units,
    pub returned: Units,
    pub total: Units,
}

impl From<WasteCounters> for WasteSummary {
    fn from(counters: WasteCounters) -> Self {
        Self {
            defective: counters.defective_count,
            expired: counters.expired_count,
            damaged: counters.damage_count,
            returned: counters.returned_count,
            total: counters.total_waste,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastedItem {
    pub sku: String,
    pub product_name: String,
    pub quantity: Units,
    pub available_quantity: Option<Units>,
    pub foul_water: WasteCounters,
}

impl From<InventoryRecord> for WastedItem {
    fn from(record: InventoryRecord) -> Self {
        Self {
            sku: record.sku,
            product_name: record.product_name,
            quantity: record.quantity,
            available_quantity: record.available_quantity,
            foul_water: record.foul_water,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWasteReport {
    pub location: LocationKind,
    pub location_id: String,
    /// Echoed from the request; does not filter the scan.
    pub time_range: Option<String>,
    pub item_count: usize,
    pub totals: WasteSummary,
    /// Average waste per wasted item, times 100.
    pub waste_percentage: f64,
    /// Wasted items, largest total waste first.
    pub items: Vec<WastedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalWasteReport {
    pub warehouse: WasteSummary,
    pub branches: WasteSummary,
    pub combined: WasteSummary,
}
