mod common;

use anyhow::Result;
use common::{StandardStock, test_service};
use wasteledger::application::AppError;
use wasteledger::domain::{LocationKind, WasteType};

#[tokio::test]
async fn test_warehouse_waste_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    let result = service
        .record_warehouse_waste("WH1", "SKU001", "expired", 5, Some("past date".into()))
        .await?;

    assert_eq!(result.quantity, 45);
    assert_eq!(result.available_quantity, Some(45));
    assert_eq!(result.foul_water.expired_count, 5);
    assert_eq!(result.foul_water.total_waste, 5);
    assert!(result.history_recorded);

    let history = service.waste_history(None).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].waste_type, WasteType::Expired);
    assert_eq!(history[0].quantity, 5);
    assert_eq!(history[0].notes.as_deref(), Some("past date"));
    assert_eq!(history[0].location, LocationKind::Warehouse);

    let result = service
        .record_warehouse_waste("WH1", "SKU001", "damaged", 3, None)
        .await?;

    assert_eq!(result.quantity, 42);
    assert_eq!(result.available_quantity, Some(42));
    assert_eq!(result.foul_water.damage_count, 3);
    assert_eq!(result.foul_water.expired_count, 5);
    assert_eq!(result.foul_water.total_waste, 8);

    // Stored record matches what was returned
    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(record.quantity, 42);
    assert_eq!(record.foul_water, result.foul_water);
    assert_eq!(record.version, 2);

    Ok(())
}

#[tokio::test]
async fn test_available_quantity_decrements_independently() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    // SKU002: 20 on hand, 15 available
    let result = service
        .record_warehouse_waste("WH1", "SKU002", "defective", 4, None)
        .await?;

    assert_eq!(result.quantity, 16);
    assert_eq!(result.available_quantity, Some(11));
    Ok(())
}

#[tokio::test]
async fn test_branch_waste_has_no_available_quantity() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_branch(&service).await?;

    let result = service
        .record_branch_waste("BR1", "SKU003", "returned", 2, None)
        .await?;

    assert_eq!(result.quantity, 6);
    assert_eq!(result.available_quantity, None);
    assert_eq!(result.foul_water.returned_count, 2);
    assert_eq!(result.foul_water.total_waste, 2);

    let history = service.waste_history(None).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].location, LocationKind::Branch);
    assert_eq!(history[0].location_id, "BR1");
    Ok(())
}

#[tokio::test]
async fn test_same_sku_in_warehouse_and_branch_is_separate() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_all(&service).await?;

    service
        .record_branch_waste("BR1", "SKU001", "expired", 2, None)
        .await?;

    let warehouse = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    let branch = service
        .get_inventory(LocationKind::Branch, "BR1", "SKU001")
        .await?;

    assert_eq!(warehouse.foul_water.total_waste, 0);
    assert_eq!(warehouse.quantity, 50);
    assert_eq!(branch.foul_water.total_waste, 2);
    assert_eq!(branch.quantity, 10);
    Ok(())
}

#[tokio::test]
async fn test_quantities_never_go_negative() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_all(&service).await?;

    // SKU002 has 20 on hand, 15 available; waste 12 + 12 + 30
    for (waste_type, quantity) in [("expired", 12), ("damaged", 12), ("defective", 30)] {
        let result = service
            .record_warehouse_waste("WH1", "SKU002", waste_type, quantity, None)
            .await?;
        assert!(result.quantity >= 0);
        assert!(result.available_quantity.unwrap() >= 0);
        assert_eq!(
            result.foul_water.total_waste,
            result.foul_water.defective_count
                + result.foul_water.expired_count
                + result.foul_water.damage_count
                + result.foul_water.returned_count
        );
    }

    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU002")
        .await?;
    assert_eq!(record.quantity, 0);
    assert_eq!(record.available_quantity, Some(0));
    // Excess waste is still booked in full
    assert_eq!(record.foul_water.total_waste, 54);

    let result = service
        .record_branch_waste("BR1", "SKU003", "damaged", 100, None)
        .await?;
    assert_eq!(result.quantity, 0);
    Ok(())
}

#[tokio::test]
async fn test_waste_type_is_case_insensitive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    service
        .record_warehouse_waste("WH1", "SKU001", "EXPIRED", 1, None)
        .await?;
    service
        .record_warehouse_waste("WH1", "SKU001", "Returned", 2, None)
        .await?;

    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(record.foul_water.expired_count, 1);
    assert_eq!(record.foul_water.returned_count, 2);
    assert_eq!(record.foul_water.total_waste, 3);
    Ok(())
}

#[tokio::test]
async fn test_unknown_waste_type_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    let before = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;

    let result = service
        .record_warehouse_waste("WH1", "SKU001", "scratched", 5, None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidWasteType(_))));

    let after = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(before, after);
    assert!(service.waste_history(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_record_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    let result = service
        .record_warehouse_waste("WH1", "NOPE", "expired", 1, None)
        .await;
    match result {
        Err(AppError::InventoryNotFound { location, key }) => {
            assert_eq!(location, LocationKind::Warehouse);
            assert_eq!(key, "WH1_NOPE");
        }
        other => panic!("expected InventoryNotFound, got {:?}", other.map(|r| r.sku)),
    }

    // Warehouse stock does not make the branch record exist
    let result = service
        .record_branch_waste("WH1", "SKU001", "expired", 1, None)
        .await;
    assert!(matches!(result, Err(AppError::InventoryNotFound { .. })));

    assert!(service.waste_history(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_non_positive_quantity_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    for quantity in [0, -3] {
        let result = service
            .record_warehouse_waste("WH1", "SKU001", "expired", quantity, None)
            .await;
        assert!(matches!(result, Err(AppError::InvalidQuantity(_))));
    }

    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(record.quantity, 50);
    assert_eq!(record.version, 0);
    Ok(())
}

#[tokio::test]
async fn test_stale_version_update_is_refused() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    let stale = service
        .repository()
        .get_inventory(LocationKind::Warehouse, "WH1_SKU001")
        .await?
        .unwrap();

    service
        .record_warehouse_waste("WH1", "SKU001", "expired", 5, None)
        .await?;

    // A writer still holding the old version must not overwrite the update
    let mut lost = stale.clone();
    lost.apply_waste(WasteType::Damaged, 1, chrono::Utc::now()).unwrap();
    let written = service
        .repository()
        .update_inventory(&lost, stale.version)
        .await?;
    assert!(!written);

    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(record.foul_water.expired_count, 5);
    assert_eq!(record.foul_water.damage_count, 0);
    assert_eq!(record.quantity, 45);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_recordings_never_lose_updates() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    let (a, b) = tokio::join!(
        service.record_warehouse_waste("WH1", "SKU001", "expired", 3, None),
        service.record_warehouse_waste("WH1", "SKU001", "damaged", 4, None),
    );

    let mut booked = 0;
    for (result, quantity) in [(a, 3), (b, 4)] {
        match result {
            Ok(_) => booked += quantity,
            Err(AppError::ConcurrentModification { key }) => assert_eq!(key, "WH1_SKU001"),
            Err(e) => return Err(e.into()),
        }
    }

    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(record.foul_water.total_waste, booked);
    assert_eq!(record.quantity, 50 - booked);
    assert_eq!(service.waste_history(None).await?.len() as i64, record.version);
    Ok(())
}

#[tokio::test]
async fn test_history_failure_does_not_fail_recording() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    sqlx::query("DROP TABLE waste_history")
        .execute(service.repository().pool())
        .await?;

    let result = service
        .record_warehouse_waste("WH1", "SKU001", "expired", 5, None)
        .await?;
    assert!(!result.history_recorded);
    assert_eq!(result.quantity, 45);

    // The inventory update stands
    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(record.foul_water.expired_count, 5);
    Ok(())
}

#[tokio::test]
async fn test_restocking_preserves_waste_counters() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    service
        .record_warehouse_waste("WH1", "SKU001", "expired", 5, None)
        .await?;
    let record = service
        .stock_inventory(
            LocationKind::Warehouse,
            "WH1",
            "SKU001",
            "Milk 1L (new)",
            100,
            Some(90),
        )
        .await?;

    assert_eq!(record.quantity, 100);
    assert_eq!(record.available_quantity, Some(90));
    assert_eq!(record.product_name, "Milk 1L (new)");
    assert_eq!(record.foul_water.expired_count, 5);
    assert_eq!(record.foul_water.total_waste, 5);
    assert_eq!(record.version, 2);
    Ok(())
}

#[tokio::test]
async fn test_stocking_rejects_negative_quantities() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .stock_inventory(LocationKind::Branch, "BR1", "SKU1", "Bread", -1, None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidQuantity(_))));

    let result = service
        .stock_inventory(LocationKind::Warehouse, "WH1", "SKU1", "Bread", 5, Some(-2))
        .await;
    assert!(matches!(result, Err(AppError::InvalidQuantity(_))));

    assert!(
        service
            .list_inventory(LocationKind::Warehouse, "WH1")
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn test_counter_overflow_is_rejected_without_writing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStock::create_warehouse(&service).await?;

    service
        .record_warehouse_waste("WH1", "SKU001", "expired", 5, None)
        .await?;

    let result = service
        .record_warehouse_waste("WH1", "SKU001", "defective", i64::MAX, None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidQuantity(_))));

    let record = service
        .get_inventory(LocationKind::Warehouse, "WH1", "SKU001")
        .await?;
    assert_eq!(record.version, 1);
    assert_eq!(record.quantity, 45);
    assert_eq!(record.foul_water.defective_count, 0);
    assert_eq!(record.foul_water.total_waste, 5);
    assert_eq!(service.waste_history(None).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_colliding_keys_do_not_overwrite_each_other() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // ("WH_1", "X") and ("WH", "1_X") both map to the key WH_1_X
    let first = service
        .stock_inventory(LocationKind::Warehouse, "WH_1", "X", "First", 50, None)
        .await?;

    let result = service
        .stock_inventory(LocationKind::Warehouse, "WH", "1_X", "Second", 7, None)
        .await;
    match result {
        Err(AppError::KeyConflict { location, key }) => {
            assert_eq!(location, LocationKind::Warehouse);
            assert_eq!(key, "WH_1_X");
        }
        other => panic!("expected KeyConflict, got {:?}", other.map(|r| r.sku)),
    }

    let stored = service
        .get_inventory(LocationKind::Warehouse, "WH_1", "X")
        .await?;
    assert_eq!(stored, first);
    assert_eq!(stored.product_name, "First");
    assert_eq!(stored.quantity, 50);

    let result = service
        .get_inventory(LocationKind::Warehouse, "WH", "1_X")
        .await;
    assert!(matches!(result, Err(AppError::InventoryNotFound { .. })));

    let result = service
        .record_warehouse_waste("WH", "1_X", "expired", 1, None)
        .await;
    assert!(matches!(result, Err(AppError::InventoryNotFound { .. })));

    let stored = service
        .get_inventory(LocationKind::Warehouse, "WH_1", "X")
        .await?;
    assert_eq!(stored.foul_water.total_waste, 0);
    assert!(service.waste_history(None).await?.is_empty());
    Ok(())
}
