// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tempfile::TempDir;
use wasteledger::application::WasteLedgerService;
use wasteledger::domain::LocationKind;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(WasteLedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = WasteLedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: standard stock setup
pub struct StandardStock;

impl StandardStock {
    /// WH1 holds SKU001 (50 on hand, 50 available) and SKU002 (20 on hand, 15 available)
    pub async fn create_warehouse(service: &WasteLedgerService) -> Result<()> {
        service
            .stock_inventory(LocationKind::Warehouse, "WH1", "SKU001", "Milk 1L", 50, None)
            .await?;
        service
            .stock_inventory(
                LocationKind::Warehouse,
                "WH1",
                "SKU002",
                "Yogurt 500g",
                20,
                Some(15),
            )
            .await?;
        Ok(())
    }

    /// BR1 holds SKU001 (12) and SKU003 (8)
    pub async fn create_branch(service: &WasteLedgerService) -> Result<()> {
        service
            .stock_inventory(LocationKind::Branch, "BR1", "SKU001", "Milk 1L", 12, None)
            .await?;
        service
            .stock_inventory(LocationKind::Branch, "BR1", "SKU003", "Bread", 8, None)
            .await?;
        Ok(())
    }

    pub async fn create_all(service: &WasteLedgerService) -> Result<()> {
        Self::create_warehouse(service).await?;
        Self::create_branch(service).await
    }
}
