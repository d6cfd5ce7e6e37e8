use chrono::Utc;

use crate::domain::{
    InventoryRecord, IntegrityReport, LocationKind, Units, WasteCounters, WasteHistoryEvent,
    WasteType, build_integrity_report, inventory_key, sum_counters, waste_percentage,
    wasted_items,
};
use crate::storage::Repository;

use super::{AppError, GlobalWasteReport, LocationWasteReport, WasteSummary, WastedItem};

/// Number of history events returned when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Application service providing high-level operations for the waste ledger.
/// This is the primary interface for any client (CLI, import/export, etc.).
pub struct WasteLedgerService {
    repo: Repository,
}

/// Result of recording waste against an inventory record
#[derive(Debug, Clone)]
pub struct WasteRecordResult {
    pub location: LocationKind,
    pub location_id: String,
    pub sku: String,
    pub foul_water: WasteCounters,
    pub quantity: Units,
    pub available_quantity: Option<Units>,
    /// False when the inventory update committed but the history append failed.
    pub history_recorded: bool,
}

impl WasteLedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Inventory operations
    // ========================

    /// Create an inventory record, or reset the stock levels of an existing
    /// one. Waste counters of an existing record are preserved.
    pub async fn stock_inventory(
        &self,
        location: LocationKind,
        location_id: &str,
        sku: &str,
        product_name: &str,
        quantity: Units,
        available_quantity: Option<Units>,
    ) -> Result<InventoryRecord, AppError> {
        if quantity < 0 {
            return Err(AppError::InvalidQuantity(format!(
                "stock quantity must not be negative, got {}",
                quantity
            )));
        }
        if let Some(available) = available_quantity.filter(|a| *a < 0) {
            return Err(AppError::InvalidQuantity(format!(
                "available quantity must not be negative, got {}",
                available
            )));
        }

        let mut record = InventoryRecord::new(location, location_id, sku, product_name, quantity);
        if let Some(available) = available_quantity {
            record = record.with_available_quantity(available);
        }
        if !self.repo.upsert_inventory(&record).await? {
            return Err(AppError::KeyConflict {
                location,
                key: record.key(),
            });
        }

        tracing::debug!(%location, key = %record.key(), quantity, "inventory stocked");
        self.get_inventory(location, location_id, sku).await
    }

    /// Get one inventory record.
    ///
    /// Keys are not unique across pairs (`WH_1`/`X` and `WH`/`1_X` share
    /// `WH_1_X`), so a row stored under the key for another pair counts as
    /// missing.
    pub async fn get_inventory(
        &self,
        location: LocationKind,
        location_id: &str,
        sku: &str,
    ) -> Result<InventoryRecord, AppError> {
        let key = inventory_key(location_id, sku);
        self.repo
            .get_inventory(location, &key)
            .await?
            .filter(|record| record.location_id == location_id && record.sku == sku)
            .ok_or_else(|| AppError::InventoryNotFound {
                location,
                key: key.clone(),
            })
    }

    /// List the inventory of one location.
    pub async fn list_inventory(
        &self,
        location: LocationKind,
        location_id: &str,
    ) -> Result<Vec<InventoryRecord>, AppError> {
        Ok(self
            .repo
            .list_inventory_for_location(location, location_id)
            .await?)
    }

    /// List the inventory of every location of one kind.
    pub async fn list_all_inventory(
        &self,
        location: LocationKind,
    ) -> Result<Vec<InventoryRecord>, AppError> {
        Ok(self.repo.list_inventory(location).await?)
    }

    // ========================
    // Waste recording
    // ========================

    /// Book waste against an inventory record and append a history event.
    ///
    /// The inventory write is a version compare-and-swap: if another writer
    /// updated the record since it was read, nothing is written and
    /// [`AppError::ConcurrentModification`] is returned. The history append
    /// that follows is best-effort; its failure is logged and reported via
    /// [`WasteRecordResult::history_recorded`], never as an error.
    pub async fn record_waste(
        &self,
        location: LocationKind,
        location_id: &str,
        sku: &str,
        waste_type: &str,
        quantity: Units,
        notes: Option<String>,
    ) -> Result<WasteRecordResult, AppError> {
        let waste_type =
            WasteType::parse(waste_type).map_err(|e| AppError::InvalidWasteType(e.to_string()))?;
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "waste quantity must be positive, got {}",
                quantity
            )));
        }

        let mut record = self.get_inventory(location, location_id, sku).await?;
        let expected_version = record.version;
        let now = Utc::now();
        record
            .apply_waste(waste_type, quantity, now)
            .map_err(|e| AppError::InvalidQuantity(e.to_string()))?;

        if !self.repo.update_inventory(&record, expected_version).await? {
            return Err(AppError::ConcurrentModification { key: record.key() });
        }

        let mut event =
            WasteHistoryEvent::new(location, location_id, sku, waste_type, quantity, now);
        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            event = event.with_notes(notes);
        }

        let history_recorded = match self.repo.append_history(&event).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    key = %record.key(),
                    %waste_type,
                    quantity,
                    error = %e,
                    "waste recorded but history append failed"
                );
                false
            }
        };

        tracing::info!(
            %location,
            key = %record.key(),
            %waste_type,
            quantity,
            total_waste = record.foul_water.total_waste,
            "waste recorded"
        );

        Ok(WasteRecordResult {
            location,
            location_id: record.location_id,
            sku: record.sku,
            foul_water: record.foul_water,
            quantity: record.quantity,
            available_quantity: record.available_quantity,
            history_recorded,
        })
    }

    /// Book waste against a warehouse record.
    pub async fn record_warehouse_waste(
        &self,
        warehouse_id: &str,
        sku: &str,
        waste_type: &str,
        quantity: Units,
        notes: Option<String>,
    ) -> Result<WasteRecordResult, AppError> {
        self.record_waste(
            LocationKind::Warehouse,
            warehouse_id,
            sku,
            waste_type,
            quantity,
            notes,
        )
        .await
    }

    /// Book waste against a branch record.
    pub async fn record_branch_waste(
        &self,
        branch_id: &str,
        sku: &str,
        waste_type: &str,
        quantity: Units,
        notes: Option<String>,
    ) -> Result<WasteRecordResult, AppError> {
        self.record_waste(
            LocationKind::Branch,
            branch_id,
            sku,
            waste_type,
            quantity,
            notes,
        )
        .await
    }

    // ========================
    // Reporting
    // ========================

    /// Aggregate waste over one location's inventory.
    ///
    /// `time_range` is carried into the report unchanged; the scan always
    /// covers the current state of every record.
    pub async fn location_waste_report(
        &self,
        location: LocationKind,
        location_id: &str,
        time_range: Option<String>,
    ) -> Result<LocationWasteReport, AppError> {
        let records = self
            .repo
            .list_inventory_for_location(location, location_id)
            .await?;
        let items = wasted_items(records);
        let totals = sum_counters(&items);

        Ok(LocationWasteReport {
            location,
            location_id: location_id.to_string(),
            time_range,
            item_count: items.len(),
            totals: totals.into(),
            waste_percentage: waste_percentage(totals.total_waste, items.len()),
            items: items.into_iter().map(WastedItem::from).collect(),
        })
    }

    pub async fn warehouse_waste_report(
        &self,
        warehouse_id: &str,
        time_range: Option<String>,
    ) -> Result<LocationWasteReport, AppError> {
        self.location_waste_report(LocationKind::Warehouse, warehouse_id, time_range)
            .await
    }

    pub async fn branch_waste_report(
        &self,
        branch_id: &str,
        time_range: Option<String>,
    ) -> Result<LocationWasteReport, AppError> {
        self.location_waste_report(LocationKind::Branch, branch_id, time_range)
            .await
    }

    /// Waste totals across all warehouses, all branches, and both combined.
    pub async fn global_waste_report(&self) -> Result<GlobalWasteReport, AppError> {
        let warehouse = self.repo.sum_waste(LocationKind::Warehouse).await?;
        let branches = self.repo.sum_waste(LocationKind::Branch).await?;

        Ok(GlobalWasteReport {
            warehouse: WasteSummary::from(warehouse),
            branches: WasteSummary::from(branches),
            combined: WasteSummary::from(warehouse + branches),
        })
    }

    // ========================
    // History
    // ========================

    /// Most recent waste events across all locations, newest first.
    pub async fn waste_history(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<WasteHistoryEvent>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        Ok(self.repo.recent_history(limit).await?)
    }

    /// Every waste event in recording order.
    pub async fn list_all_history(&self) -> Result<Vec<WasteHistoryEvent>, AppError> {
        Ok(self.repo.list_history().await?)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check stored invariants and return a report.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let warehouse = self.repo.list_inventory(LocationKind::Warehouse).await?;
        let branches = self.repo.list_inventory(LocationKind::Branch).await?;
        let history = self.repo.list_history().await?;

        Ok(build_integrity_report(&warehouse, &branches, &history))
    }
}
