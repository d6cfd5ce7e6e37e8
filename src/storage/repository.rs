use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{InventoryRecord, LocationKind, WasteCounters, WasteHistoryEvent, WasteType};

use super::{MIGRATION_001_INVENTORY, MIGRATION_002_WASTE_HISTORY};

/// Repository for persisting and querying inventory records and waste history.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INVENTORY)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_WASTE_HISTORY)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        tracing::debug!("database migrations applied");
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========================
    // Inventory operations
    // ========================

    /// Insert a record, or replace the stock levels and product name of an
    /// existing one. Waste counters of an existing record are kept.
    ///
    /// Returns false when the key is already held by a different
    /// `(location_id, sku)` pair; the stored row is left as is.
    pub async fn upsert_inventory(&self, record: &InventoryRecord) -> Result<bool> {
        let table = inventory_table(record.location);
        let sql = match record.location {
            LocationKind::Warehouse => format!(
                r#"
                INSERT INTO {table} (id, location_id, sku, product_name, quantity, available_quantity,
                    defective_count, expired_count, damage_count, returned_count, total_waste, last_updated, version)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
                ON CONFLICT(id) DO UPDATE SET
                    product_name = excluded.product_name,
                    quantity = excluded.quantity,
                    available_quantity = excluded.available_quantity,
                    last_updated = excluded.last_updated,
                    version = {table}.version + 1
                WHERE {table}.location_id = excluded.location_id
                    AND {table}.sku = excluded.sku
                "#
            ),
            LocationKind::Branch => format!(
                r#"
                INSERT INTO {table} (id, location_id, sku, product_name, quantity,
                    defective_count, expired_count, damage_count, returned_count, total_waste, last_updated, version)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
                ON CONFLICT(id) DO UPDATE SET
                    product_name = excluded.product_name,
                    quantity = excluded.quantity,
                    last_updated = excluded.last_updated,
                    version = {table}.version + 1
                WHERE {table}.location_id = excluded.location_id
                    AND {table}.sku = excluded.sku
                "#
            ),
        };

        let mut query = sqlx::query(&sql)
            .bind(record.key())
            .bind(&record.location_id)
            .bind(&record.sku)
            .bind(&record.product_name)
            .bind(record.quantity);
        if record.location == LocationKind::Warehouse {
            query = query.bind(record.available_quantity.unwrap_or(0));
        }
        let result = query
            .bind(record.foul_water.defective_count)
            .bind(record.foul_water.expired_count)
            .bind(record.foul_water.damage_count)
            .bind(record.foul_water.returned_count)
            .bind(record.foul_water.total_waste)
            .bind(encode_timestamp(record.last_updated))
            .execute(&self.pool)
            .await
            .context("Failed to save inventory record")?;
        Ok(result.rows_affected() == 1)
    }

    /// Get an inventory record by its composite key.
    pub async fn get_inventory(
        &self,
        location: LocationKind,
        key: &str,
    ) -> Result<Option<InventoryRecord>> {
        let sql = format!("{} WHERE id = ?", select_inventory(location));
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch inventory record")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_inventory(location, &row)?)),
            None => Ok(None),
        }
    }

    /// Write back a mutated record if its stored version still equals
    /// `expected_version`. Returns false when no row matched, i.e. the
    /// record is missing or another writer got there first. Never inserts.
    pub async fn update_inventory(
        &self,
        record: &InventoryRecord,
        expected_version: i64,
    ) -> Result<bool> {
        let table = inventory_table(record.location);
        let available_set = if record.location.tracks_available_quantity() {
            "available_quantity = ?,"
        } else {
            ""
        };
        let sql = format!(
            r#"
            UPDATE {table}
            SET product_name = ?, quantity = ?, {available_set}
                defective_count = ?, expired_count = ?, damage_count = ?, returned_count = ?,
                total_waste = ?, last_updated = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#
        );

        let mut query = sqlx::query(&sql)
            .bind(&record.product_name)
            .bind(record.quantity);
        if record.location.tracks_available_quantity() {
            query = query.bind(record.available_quantity.unwrap_or(0));
        }
        let result = query
            .bind(record.foul_water.defective_count)
            .bind(record.foul_water.expired_count)
            .bind(record.foul_water.damage_count)
            .bind(record.foul_water.returned_count)
            .bind(record.foul_water.total_waste)
            .bind(encode_timestamp(record.last_updated))
            .bind(record.key())
            .bind(expected_version)
            .execute(&self.pool)
            .await
            .context("Failed to update inventory record")?;

        Ok(result.rows_affected() == 1)
    }

    /// List every record of one location, ordered by SKU.
    pub async fn list_inventory_for_location(
        &self,
        location: LocationKind,
        location_id: &str,
    ) -> Result<Vec<InventoryRecord>> {
        let sql = format!(
            "{} WHERE location_id = ? ORDER BY sku",
            select_inventory(location)
        );
        let rows = sqlx::query(&sql)
            .bind(location_id)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to scan {} inventory", location))?;

        rows.iter()
            .map(|row| Self::row_to_inventory(location, row))
            .collect()
    }

    /// List every record of one location kind.
    pub async fn list_inventory(&self, location: LocationKind) -> Result<Vec<InventoryRecord>> {
        let sql = format!(
            "{} ORDER BY location_id, sku",
            select_inventory(location)
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to scan {} inventory", location))?;

        rows.iter()
            .map(|row| Self::row_to_inventory(location, row))
            .collect()
    }

    /// Sum the waste counters of a whole table in one query.
    pub async fn sum_waste(&self, location: LocationKind) -> Result<WasteCounters> {
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(defective_count), 0) as defective_count,
                COALESCE(SUM(expired_count), 0) as expired_count,
                COALESCE(SUM(damage_count), 0) as damage_count,
                COALESCE(SUM(returned_count), 0) as returned_count
            FROM {}
            "#,
            inventory_table(location)
        );
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to sum {} waste", location))?;

        Ok(WasteCounters::new(
            row.get("defective_count"),
            row.get("expired_count"),
            row.get("damage_count"),
            row.get("returned_count"),
        ))
    }

    fn row_to_inventory(
        location: LocationKind,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<InventoryRecord> {
        let last_updated_str: String = row.get("last_updated");

        Ok(InventoryRecord {
            location,
            location_id: row.get("location_id"),
            sku: row.get("sku"),
            product_name: row.get("product_name"),
            quantity: row.get("quantity"),
            available_quantity: row.get("available_quantity"),
            // Stored total is read as-is so drift stays visible to integrity checks
            foul_water: WasteCounters {
                defective_count: row.get("defective_count"),
                expired_count: row.get("expired_count"),
                damage_count: row.get("damage_count"),
                returned_count: row.get("returned_count"),
                total_waste: row.get("total_waste"),
            },
            last_updated: decode_timestamp(&last_updated_str)
                .context("Invalid last_updated timestamp")?,
            version: row.get("version"),
        })
    }

    // ========================
    // History operations
    // ========================

    /// Append one event to the waste history.
    pub async fn append_history(&self, event: &WasteHistoryEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO waste_history (id, location, location_id, sku, waste_type, quantity, notes, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.location.as_str())
        .bind(&event.location_id)
        .bind(&event.sku)
        .bind(event.waste_type.as_str())
        .bind(event.quantity)
        .bind(&event.notes)
        .bind(encode_timestamp(event.timestamp))
        .execute(&self.pool)
        .await
        .context("Failed to append waste history")?;
        Ok(())
    }

    /// Most recent events first, at most `limit` of them.
    pub async fn recent_history(&self, limit: usize) -> Result<Vec<WasteHistoryEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, location, location_id, sku, waste_type, quantity, notes, timestamp
            FROM waste_history
            ORDER BY timestamp DESC, seq DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch waste history")?;

        rows.iter().map(Self::row_to_event).collect()
    }

    /// Every event in insertion order.
    pub async fn list_history(&self) -> Result<Vec<WasteHistoryEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, location, location_id, sku, waste_type, quantity, notes, timestamp
            FROM waste_history
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list waste history")?;

        rows.iter().map(Self::row_to_event).collect()
    }

    fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<WasteHistoryEvent> {
        let id_str: String = row.get("id");
        let location_str: String = row.get("location");
        let waste_type_str: String = row.get("waste_type");
        let timestamp_str: String = row.get("timestamp");

        Ok(WasteHistoryEvent {
            id: Uuid::parse_str(&id_str).context("Invalid event ID")?,
            location: LocationKind::from_str(&location_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid location: {}", location_str))?,
            location_id: row.get("location_id"),
            sku: row.get("sku"),
            waste_type: WasteType::parse(&waste_type_str)?,
            quantity: row.get("quantity"),
            notes: row.get("notes"),
            timestamp: decode_timestamp(&timestamp_str).context("Invalid timestamp")?,
        })
    }
}

fn inventory_table(location: LocationKind) -> &'static str {
    match location {
        LocationKind::Warehouse => "warehouse_inventory",
        LocationKind::Branch => "branch_inventory",
    }
}

// Branch rows have no available quantity column; it reads back as NULL.
fn select_inventory(location: LocationKind) -> String {
    let available = match location {
        LocationKind::Warehouse => "available_quantity",
        LocationKind::Branch => "NULL AS available_quantity",
    };
    format!(
        "SELECT id, location_id, sku, product_name, quantity, {available}, \
         defective_count, expired_count, damage_count, returned_count, total_waste, \
         last_updated, version FROM {}",
        inventory_table(location)
    )
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
