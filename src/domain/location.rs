use serde::{Deserialize, Serialize};

/// Identifier of a warehouse or a branch.
pub type LocationId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    /// Central stock; tracks a sellable quantity separate from on-hand
    Warehouse,
    /// Retail outlet; on-hand quantity only
    Branch,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Warehouse => "warehouse",
            LocationKind::Branch => "branch",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "warehouse" => Some(LocationKind::Warehouse),
            "branch" => Some(LocationKind::Branch),
            _ => None,
        }
    }

    /// Whether records at this kind of location carry an available quantity.
    pub fn tracks_available_quantity(&self) -> bool {
        matches!(self, LocationKind::Warehouse)
    }
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the composite key addressing one inventory record: `{location_id}_{sku}`.
pub fn inventory_key(location_id: &str, sku: &str) -> String {
    format!("{}_{}", location_id, sku)
}
