use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    LocationId, LocationKind, Units, WasteCounters, WasteOverflow, WasteType, inventory_key,
};

/// Stock of one SKU at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub location: LocationKind,
    pub location_id: LocationId,
    pub sku: String,
    pub product_name: String,
    pub quantity: Units,
    /// Sellable quantity; only warehouses track it.
    pub available_quantity: Option<Units>,
    pub foul_water: WasteCounters,
    pub last_updated: DateTime<Utc>,
    /// Row version, bumped on every write.
    pub version: i64,
}

impl InventoryRecord {
    pub fn new(
        location: LocationKind,
        location_id: impl Into<LocationId>,
        sku: impl Into<String>,
        product_name: impl Into<String>,
        quantity: Units,
    ) -> Self {
        Self {
            location,
            location_id: location_id.into(),
            sku: sku.into(),
            product_name: product_name.into(),
            quantity,
            available_quantity: location.tracks_available_quantity().then_some(quantity),
            foul_water: WasteCounters::default(),
            last_updated: Utc::now(),
            version: 0,
        }
    }

    /// Set the sellable quantity. No-op for branch records.
    pub fn with_available_quantity(mut self, available: Units) -> Self {
        if self.location.tracks_available_quantity() {
            self.available_quantity = Some(available);
        }
        self
    }

    pub fn key(&self) -> String {
        inventory_key(&self.location_id, &self.sku)
    }

    /// Book `quantity` units of waste against this record.
    ///
    /// Stock levels are floored at zero: waste beyond what is on hand is
    /// clamped, not rejected. A quantity that would overflow the counters
    /// leaves the record untouched.
    pub fn apply_waste(
        &mut self,
        waste_type: WasteType,
        quantity: Units,
        at: DateTime<Utc>,
    ) -> Result<(), WasteOverflow> {
        self.foul_water.record(waste_type, quantity)?;
        self.quantity = (self.quantity - quantity).max(0);
        if self.location.tracks_available_quantity() {
            self.available_quantity = Some((self.available_quantity.unwrap_or(0) - quantity).max(0));
        }
        self.last_updated = at;
        Ok(())
    }

    pub fn has_waste(&self) -> bool {
        self.foul_water.has_waste()
    }
}
