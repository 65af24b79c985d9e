//! FieldOps KPI - batch KPI report over exported service orders
//!
//! # Usage
//!
//! ```bash
//! # Whole export, built-in rules
//! fieldops-kpi --orders orders.json --pretty
//!
//! # March 2024 only, reopening rate narrowed to corrective orders
//! fieldops-kpi --orders orders.json --month 3 --year 2024 --original-type Corretiva
//!
//! # Show the effective configuration
//! fieldops-kpi --print-config
//! ```
//!
//! # Environment Variables
//!
//! - `FIELDOPS_KPI_CONFIG`: Path to the TOML rules file (default: ./kpi_config.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fieldops_kpi::{compute_metrics, FilterContext, KpiConfig, ServiceOrder};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fieldops-kpi")]
#[command(about = "Service-level and reopening KPIs for field-service work orders")]
#[command(version)]
struct CliArgs {
    /// JSON file holding an array of service orders
    #[arg(long, value_name = "FILE", required_unless_present = "print_config")]
    orders: Option<PathBuf>,

    /// TOML rules file (overrides FIELDOPS_KPI_CONFIG and ./kpi_config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Month to analyse (1-12), matched on the finalization date
    #[arg(long)]
    month: Option<String>,

    /// Year to analyse (4 digits), matched on the finalization date
    #[arg(long)]
    year: Option<String>,

    /// Narrow the headline reopening rate to one original service type
    #[arg(long, default_value = "")]
    original_type: String,

    /// Emit the all-zero report without computing anything
    #[arg(long)]
    hide_data: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<KpiConfig> {
    match path {
        Some(path) => KpiConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(KpiConfig::load()),
    }
}

fn load_orders(path: &PathBuf) -> Result<Vec<ServiceOrder>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read orders file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid orders JSON in {}", path.display()))
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_ref())?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let Some(orders_path) = args.orders.as_ref() else {
        return Err(anyhow::anyhow!("--orders is required"));
    };
    let orders = load_orders(orders_path)?;
    info!(
        "Loaded {} orders | window: {} days | original types: {}",
        orders.len(),
        config.reopening.window_days,
        config.reopening.original_types.join(", ")
    );

    let ctx = FilterContext {
        selected_month: args.month,
        selected_year: args.year,
        original_service_type_filter: args.original_type,
        show_data: !args.hide_data,
    };
    let report = compute_metrics(&orders, &ctx, &config)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
