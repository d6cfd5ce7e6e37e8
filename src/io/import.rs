use anyhow::Result;
use std::io::Read;

use crate::application::{AppError, WasteLedgerService};
use crate::domain::{LocationKind, Units};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    /// Leave records that already exist untouched instead of restocking them
    pub skip_existing: bool,
}

/// Importer for stocking inventory from CSV
pub struct Importer<'a> {
    service: &'a WasteLedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a WasteLedgerService) -> Self {
        Self { service }
    }

    /// Import stock levels from CSV with the columns
    /// `location, location_id, sku, product_name, quantity, available_quantity`.
    pub async fn import_inventory_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut result = ImportResult::default();

        for (line_num, row) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match row {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let location_str = record.get(0).unwrap_or("");
            let location_id = record.get(1).unwrap_or("").trim();
            let sku = record.get(2).unwrap_or("").trim();
            let product_name = record.get(3).unwrap_or("").trim();
            let quantity_str = record.get(4).unwrap_or("");
            let available_str = record.get(5).unwrap_or("");

            let Some(location) = LocationKind::from_str(location_str) else {
                result.errors.push(ImportError {
                    line,
                    field: Some("location".to_string()),
                    error: format!("Unknown location kind: '{}'", location_str),
                });
                continue;
            };

            if location_id.is_empty() || sku.is_empty() {
                result.errors.push(ImportError {
                    line,
                    field: Some(if sku.is_empty() { "sku" } else { "location_id" }.to_string()),
                    error: "Value is required".to_string(),
                });
                continue;
            }

            let quantity = match parse_units(quantity_str) {
                Ok(Some(q)) => q,
                Ok(None) => 0,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some("quantity".to_string()),
                        error: e,
                    });
                    continue;
                }
            };

            let available = match parse_units(available_str) {
                Ok(a) => a,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some("available_quantity".to_string()),
                        error: e,
                    });
                    continue;
                }
            };

            if options.skip_existing {
                match self.service.get_inventory(location, location_id, sku).await {
                    Ok(_) => {
                        result.skipped += 1;
                        continue;
                    }
                    Err(AppError::InventoryNotFound { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
            }

            if options.dry_run {
                result.imported += 1;
                continue;
            }

            let name = if product_name.is_empty() { sku } else { product_name };
            match self
                .service
                .stock_inventory(location, location_id, sku, name, quantity, available)
                .await
            {
                Ok(_) => result.imported += 1,
                Err(e) => result.errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("Stocking failed: {}", e),
                }),
            }
        }

        Ok(result)
    }
}

// Empty cells parse as None. Stock levels are never negative.
fn parse_units(s: &str) -> std::result::Result<Option<Units>, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let units = s
        .parse::<Units>()
        .map_err(|_| format!("Invalid whole number: '{}'", s))?;
    if units < 0 {
        return Err(format!("Must not be negative: '{}'", s));
    }
    Ok(Some(units))
}
