mod repository;

pub use repository::*;

/// SQL migration for the warehouse and branch inventory tables
pub const MIGRATION_001_INVENTORY: &str = include_str!("migrations/001_inventory.sql");

/// SQL migration for the waste history trail
pub const MIGRATION_002_WASTE_HISTORY: &str = include_str!("migrations/002_waste_history.sql");
