//! Shared data structures for work-order KPI computation
//!
//! - `ServiceOrder`: input record from the import pipeline
//! - `ServiceCategory`: canonical TV / Fibra split
//! - `FilterContext`: caller's month / year / original-type selection
//! - `TimeMetrics`, `ReopeningMetrics`, `MetricsReport`: computed aggregates

mod category;
mod filter;
mod order;
mod report;

pub use category::*;
pub use filter::*;
pub use order::*;
pub use report::*;
