use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LocationId, LocationKind, Units, WasteType};

pub type EventId = Uuid;

/// Immutable audit record of one waste recording.
///
/// Refers to its inventory record by value (location id + SKU), so later
/// changes to the inventory never touch history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteHistoryEvent {
    pub id: EventId,
    pub location: LocationKind,
    pub location_id: LocationId,
    pub sku: String,
    pub waste_type: WasteType,
    pub quantity: Units,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl WasteHistoryEvent {
    pub fn new(
        location: LocationKind,
        location_id: impl Into<LocationId>,
        sku: impl Into<String>,
        waste_type: WasteType,
        quantity: Units,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            location,
            location_id: location_id.into(),
            sku: sku.into(),
            waste_type,
            quantity,
            notes: None,
            timestamp,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
