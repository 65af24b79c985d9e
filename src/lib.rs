//! FieldOps KPI: field-service work-order metrics
//!
//! Turns a batch of service orders into two families of KPIs for a period:
//!
//! - **Time metrics**: completion time against per-category SLA goals
//! - **Reopening metrics**: repeat visits at the same installation point
//!   within a configurable window, broken down by technician, category,
//!   city, neighborhood, original type and reason
//!
//! ## Architecture
//!
//! - **Config**: business rules loaded from TOML (`KpiConfig`)
//! - **Normalize**: one text-folding step applied at ingestion
//! - **Metrics**: eligibility filter, time calculator, pairing engine,
//!   aggregator and the `compute_metrics` facade

pub mod config;
pub mod metrics;
pub mod normalize;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, KpiConfig, LinkageStrategy};

// Re-export the facade
pub use metrics::{compute_metrics, compute_metrics_for_windows, MetricsError};

// Re-export commonly used types
pub use types::{
    AnomalyTally, FilterContext, MetricsReport, PairRecord, ReopeningMetrics, ServiceCategory,
    ServiceOrder, TimeMetrics,
};
