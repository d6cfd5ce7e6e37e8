use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::application::WasteLedgerService;
use crate::domain::LocationKind;

/// Exporter for converting ledger data to CSV or JSON
pub struct Exporter<'a> {
    service: &'a WasteLedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a WasteLedgerService) -> Self {
        Self { service }
    }

    /// Export the full waste history to CSV, oldest first
    pub async fn export_history_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let events = self.service.list_all_history().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "timestamp",
            "location",
            "location_id",
            "sku",
            "waste_type",
            "quantity",
            "notes",
        ])?;

        for event in &events {
            csv_writer.write_record([
                event.id.to_string(),
                event.timestamp.to_rfc3339(),
                event.location.as_str().to_string(),
                event.location_id.clone(),
                event.sku.clone(),
                event.waste_type.as_str().to_string(),
                event.quantity.to_string(),
                event.notes.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(events.len())
    }

    /// Export inventory with waste counters to CSV.
    /// With no location id, every location of the given kind is exported.
    pub async fn export_inventory_csv<W: Write>(
        &self,
        location: LocationKind,
        location_id: Option<&str>,
        writer: W,
    ) -> Result<usize> {
        let records = match location_id {
            Some(id) => self.service.list_inventory(location, id).await?,
            None => self.service.list_all_inventory(location).await?,
        };
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "location",
            "location_id",
            "sku",
            "product_name",
            "quantity",
            "available_quantity",
            "defective",
            "expired",
            "damaged",
            "returned",
            "total_waste",
            "last_updated",
        ])?;

        for record in &records {
            csv_writer.write_record([
                record.location.as_str().to_string(),
                record.location_id.clone(),
                record.sku.clone(),
                record.product_name.clone(),
                record.quantity.to_string(),
                record
                    .available_quantity
                    .map(|q| q.to_string())
                    .unwrap_or_default(),
                record.foul_water.defective_count.to_string(),
                record.foul_water.expired_count.to_string(),
                record.foul_water.damage_count.to_string(),
                record.foul_water.returned_count.to_string(),
                record.foul_water.total_waste.to_string(),
                record.last_updated.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(records.len())
    }
}

/// Write any report as pretty-printed JSON
pub fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
