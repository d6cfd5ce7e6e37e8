use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{LocationWasteReport, WasteLedgerService, WasteSummary};
use crate::domain::{InventoryRecord, LocationKind, Units};

/// Wasteledger - waste tracking for warehouse and branch inventory
#[derive(Parser)]
#[command(name = "wasteledger")]
#[command(about = "A local-first ledger of defective, expired, damaged and returned stock")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "WASTELEDGER_DB", default_value = "wasteledger.db")]
    pub database: String,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Create an inventory record or reset its stock levels
    Stock {
        /// Location kind: warehouse or branch
        location: String,

        /// Warehouse or branch identifier
        location_id: String,

        /// Product SKU
        sku: String,

        /// Product display name (defaults to the SKU)
        #[arg(short, long)]
        name: Option<String>,

        /// On-hand quantity
        #[arg(short, long)]
        quantity: Units,

        /// Sellable quantity (warehouses only, defaults to on-hand)
        #[arg(short, long)]
        available: Option<Units>,
    },

    /// Inventory inspection commands
    #[command(subcommand)]
    Inventory(InventoryCommands),

    /// Record waste against an inventory record
    Record {
        /// Location kind: warehouse or branch
        location: String,

        /// Warehouse or branch identifier
        location_id: String,

        /// Product SKU
        sku: String,

        /// Waste type: defective, expired, damaged, returned
        waste_type: String,

        /// Number of units wasted
        quantity: Units,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Generate waste reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Show the most recent waste events
    History {
        /// Maximum number of events to show
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// Verify ledger integrity
    Check,

    /// Export data to CSV
    Export {
        /// What to export: history, inventory
        export_type: String,

        /// Location kind for inventory export: warehouse or branch
        #[arg(long, default_value = "warehouse")]
        location: String,

        /// Restrict inventory export to one location
        #[arg(long)]
        location_id: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import inventory stock levels from CSV
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Leave existing records untouched
        #[arg(long)]
        skip_existing: bool,
    },
}

#[derive(Subcommand)]
pub enum InventoryCommands {
    /// Show one inventory record
    Show {
        /// Location kind: warehouse or branch
        location: String,

        /// Warehouse or branch identifier
        location_id: String,

        /// Product SKU
        sku: String,
    },

    /// List the inventory of one location
    List {
        /// Location kind: warehouse or branch
        location: String,

        /// Warehouse or branch identifier
        location_id: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Waste report for one warehouse
    Warehouse {
        /// Warehouse identifier
        id: String,

        /// Time range label, echoed in the report
        #[arg(long)]
        time_range: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Waste report for one branch
    Branch {
        /// Branch identifier
        id: String,

        /// Time range label, echoed in the report
        #[arg(long)]
        time_range: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Waste totals across all warehouses and branches
    All {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set. Recorded waste is logged
    /// at info, so that is the quiet default.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "wasteledger=debug"
        } else {
            "wasteledger=info"
        }
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                WasteLedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Stock {
                location,
                location_id,
                sku,
                name,
                quantity,
                available,
            } => {
                let service = WasteLedgerService::connect(&self.database).await?;
                let location = parse_location(&location)?;
                let name = name.unwrap_or_else(|| sku.clone());
                let record = service
                    .stock_inventory(location, &location_id, &sku, &name, quantity, available)
                    .await?;
                println!(
                    "Stocked {} {}: quantity {}{}",
                    record.location,
                    record.key(),
                    record.quantity,
                    record
                        .available_quantity
                        .map(|a| format!(", available {}", a))
                        .unwrap_or_default()
                );
            }

            Commands::Inventory(cmd) => {
                let service = WasteLedgerService::connect(&self.database).await?;
                run_inventory_command(&service, cmd).await?;
            }

            Commands::Record {
                location,
                location_id,
                sku,
                waste_type,
                quantity,
                notes,
            } => {
                let service = WasteLedgerService::connect(&self.database).await?;
                let location = parse_location(&location)?;
                let result = service
                    .record_waste(location, &location_id, &sku, &waste_type, quantity, notes)
                    .await?;

                println!(
                    "Recorded {} {} against {} {}_{}",
                    quantity,
                    waste_type.trim().to_lowercase(),
                    result.location,
                    result.location_id,
                    result.sku
                );
                println!("  Quantity:    {}", result.quantity);
                if let Some(available) = result.available_quantity {
                    println!("  Available:   {}", available);
                }
                println!("  Total waste: {}", result.foul_water.total_waste);
                if !result.history_recorded {
                    eprintln!("Warning: history event could not be recorded");
                }
            }

            Commands::Report(cmd) => {
                let service = WasteLedgerService::connect(&self.database).await?;
                run_report_command(&service, cmd).await?;
            }

            Commands::History { limit } => {
                let service = WasteLedgerService::connect(&self.database).await?;
                run_history_command(&service, limit).await?;
            }

            Commands::Check => {
                let service = WasteLedgerService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                export_type,
                location,
                location_id,
                output,
            } => {
                let service = WasteLedgerService::connect(&self.database).await?;
                run_export_command(&service, &export_type, &location, location_id, output)
                    .await?;
            }

            Commands::Import {
                input,
                dry_run,
                skip_existing,
            } => {
                let service = WasteLedgerService::connect(&self.database).await?;
                run_import_command(&service, input, dry_run, skip_existing).await?;
            }
        }

        Ok(())
    }
}

fn parse_location(s: &str) -> Result<LocationKind> {
    LocationKind::from_str(s)
        .with_context(|| format!("Invalid location '{}'. Use: warehouse or branch", s))
}

async fn run_inventory_command(service: &WasteLedgerService, cmd: InventoryCommands) -> Result<()> {
    match cmd {
        InventoryCommands::Show {
            location,
            location_id,
            sku,
        } => {
            let location = parse_location(&location)?;
            let record = service.get_inventory(location, &location_id, &sku).await?;
            print_inventory_record(&record);
        }

        InventoryCommands::List {
            location,
            location_id,
        } => {
            let location = parse_location(&location)?;
            let records = service.list_inventory(location, &location_id).await?;
            if records.is_empty() {
                println!("No inventory found for {} {}.", location, location_id);
                return Ok(());
            }

            println!(
                "{:<16} {:<24} {:>8} {:>10} {:>8}",
                "SKU", "PRODUCT", "QTY", "AVAILABLE", "WASTE"
            );
            println!("{}", "-".repeat(70));
            for record in records {
                println!(
                    "{:<16} {:<24} {:>8} {:>10} {:>8}",
                    truncate(&record.sku, 16),
                    truncate(&record.product_name, 24),
                    record.quantity,
                    record
                        .available_quantity
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    record.foul_water.total_waste
                );
            }
        }
    }
    Ok(())
}

fn print_inventory_record(record: &InventoryRecord) {
    println!("Inventory: {} {}", record.location, record.key());
    println!("  Product:     {}", record.product_name);
    println!("  Quantity:    {}", record.quantity);
    if let Some(available) = record.available_quantity {
        println!("  Available:   {}", available);
    }
    println!("  Waste:");
    println!("    Defective: {}", record.foul_water.defective_count);
    println!("    Expired:   {}", record.foul_water.expired_count);
    println!("    Damaged:   {}", record.foul_water.damage_count);
    println!("    Returned:  {}", record.foul_water.returned_count);
    println!("    Total:     {}", record.foul_water.total_waste);
    println!(
        "  Updated:     {}",
        record.last_updated.format("%Y-%m-%d %H:%M:%S")
    );
}

async fn run_report_command(service: &WasteLedgerService, cmd: ReportCommands) -> Result<()> {
    use crate::io::write_json;

    match cmd {
        ReportCommands::Warehouse {
            id,
            time_range,
            format,
        } => {
            let report = service.warehouse_waste_report(&id, time_range).await?;
            match format.as_str() {
                "json" => write_json(&report, std::io::stdout())?,
                _ => print_location_report(&report),
            }
        }

        ReportCommands::Branch {
            id,
            time_range,
            format,
        } => {
            let report = service.branch_waste_report(&id, time_range).await?;
            match format.as_str() {
                "json" => write_json(&report, std::io::stdout())?,
                _ => print_location_report(&report),
            }
        }

        ReportCommands::All { format } => {
            let report = service.global_waste_report().await?;
            match format.as_str() {
                "json" => write_json(&report, std::io::stdout())?,
                _ => {
                    println!("Waste across all locations\n");
                    print_summary_header();
                    print_summary_row("Warehouses", &report.warehouse);
                    print_summary_row("Branches", &report.branches);
                    println!("{}", "-".repeat(66));
                    print_summary_row("Combined", &report.combined);
                }
            }
        }
    }
    Ok(())
}

fn print_location_report(report: &LocationWasteReport) {
    println!("Waste report: {} {}", report.location, report.location_id);
    if let Some(range) = &report.time_range {
        println!("Time range:   {}", range);
    }
    println!("Wasted items: {}", report.item_count);
    println!("Waste index:  {:.2}", report.waste_percentage);
    println!();

    if report.items.is_empty() {
        println!("No waste recorded.");
        return;
    }

    println!(
        "{:<16} {:<20} {:>9} {:>8} {:>8} {:>9} {:>7}",
        "SKU", "PRODUCT", "DEFECTIVE", "EXPIRED", "DAMAGED", "RETURNED", "TOTAL"
    );
    println!("{}", "-".repeat(83));
    for item in &report.items {
        println!(
            "{:<16} {:<20} {:>9} {:>8} {:>8} {:>9} {:>7}",
            truncate(&item.sku, 16),
            truncate(&item.product_name, 20),
            item.foul_water.defective_count,
            item.foul_water.expired_count,
            item.foul_water.damage_count,
            item.foul_water.returned_count,
            item.foul_water.total_waste
        );
    }
    println!("{}", "-".repeat(83));
    println!(
        "{:<37} {:>9} {:>8} {:>8} {:>9} {:>7}",
        "Total",
        report.totals.defective,
        report.totals.expired,
        report.totals.damaged,
        report.totals.returned,
        report.totals.total
    );
}

fn print_summary_header() {
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "SCOPE", "DEFECTIVE", "EXPIRED", "DAMAGED", "RETURNED", "TOTAL"
    );
    println!("{}", "-".repeat(66));
}

fn print_summary_row(label: &str, summary: &WasteSummary) {
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10}",
        label,
        summary.defective,
        summary.expired,
        summary.damaged,
        summary.returned,
        summary.total
    );
}

async fn run_history_command(service: &WasteLedgerService, limit: usize) -> Result<()> {
    let events = service.waste_history(Some(limit)).await?;

    if events.is_empty() {
        println!("No waste events found.");
        return Ok(());
    }

    println!(
        "{:<20} {:<10} {:<20} {:<10} {:>6} NOTES",
        "DATE", "LOCATION", "KEY", "TYPE", "QTY"
    );
    println!("{}", "-".repeat(80));
    for event in events {
        println!(
            "{:<20} {:<10} {:<20} {:<10} {:>6} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.location,
            truncate(&format!("{}_{}", event.location_id, event.sku), 20),
            event.waste_type,
            event.quantity,
            truncate(event.notes.as_deref().unwrap_or(""), 30)
        );
    }
    Ok(())
}

async fn run_check_command(service: &WasteLedgerService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Warehouse records: {}", report.warehouse_records);
    println!("Branch records:    {}", report.branch_records);
    println!("History events:    {}", report.history_events);
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    service: &WasteLedgerService,
    export_type: &str,
    location: &str,
    location_id: Option<String>,
    output: Option<String>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create file: {}", path))?,
        ),
        None => Box::new(stdout()),
    };

    let exporter = Exporter::new(service);
    let count = match export_type {
        "history" => exporter.export_history_csv(writer).await?,
        "inventory" => {
            let location = parse_location(location)?;
            exporter
                .export_inventory_csv(location, location_id.as_deref(), writer)
                .await?
        }
        other => anyhow::bail!("Unknown export type '{}'. Use: history, inventory", other),
    };

    if let Some(path) = output {
        eprintln!("Exported {} {} record(s) to {}", count, export_type, path);
    }
    Ok(())
}

async fn run_import_command(
    service: &WasteLedgerService,
    input: Option<String>,
    dry_run: bool,
    skip_existing: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    let reader: Box<dyn Read> = match &input {
        Some(path) => {
            Box::new(File::open(path).with_context(|| format!("Failed to open file: {}", path))?)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        skip_existing,
    };
    let result = Importer::new(service)
        .import_inventory_csv(reader, options)
        .await?;

    if dry_run {
        println!("Dry run: {} record(s) would be imported", result.imported);
    } else {
        println!("Imported {} record(s)", result.imported);
    }
    if result.skipped > 0 {
        println!("Skipped {} existing record(s)", result.skipped);
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match &err.field {
                Some(field) => println!("  line {} ({}): {}", err.line, field, err.error),
                None => println!("  line {}: {}", err.line, err.error),
            }
        }
        anyhow::bail!("{} row(s) failed to import", result.errors.len());
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
