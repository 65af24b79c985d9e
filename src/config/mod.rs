//! KPI Configuration Module
//!
//! Business rules (status whitelist, goal table, original service types,
//! reopening window) loaded from TOML instead of being compiled in.
//!
//! ## Loading Order
//!
//! 1. `FIELDOPS_KPI_CONFIG` environment variable (path to TOML file)
//! 2. `kpi_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is an explicit value handed to the engine on every call, so
//! tests and tenants can each use their own:
//!
//! ```ignore
//! let config = KpiConfig::load();
//! let report = metrics::compute_metrics(&orders, &FilterContext::default(), &config)?;
//! ```

mod kpi_config;
pub mod defaults;
pub mod validation;

pub use kpi_config::*;
