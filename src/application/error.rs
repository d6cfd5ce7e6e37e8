use thiserror::Error;

use crate::domain::LocationKind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Inventory record not found: {location} {key}")]
    InventoryNotFound { location: LocationKind, key: String },

    #[error("Invalid waste type: {0}")]
    InvalidWasteType(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Inventory key {key} at {location} is already used by another location/SKU pair")]
    KeyConflict { location: LocationKind, key: String },

    #[error("Inventory record {key} was modified concurrently; re-read and try again")]
    ConcurrentModification { key: String },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
