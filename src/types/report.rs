//! Computed KPI aggregates returned to the presentation layer
//!
//! Every aggregate here is a fresh value per computation; nothing is
//! updated in place across filter changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ServiceCategory;

// ============================================================================
// Time Metrics
// ============================================================================

/// SLA compliance for the analysed window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeMetrics {
    pub total_orders: usize,
    pub orders_within_goal: usize,
    pub orders_outside_goal: usize,
    /// 0..=100
    pub percent_within_goal: f64,
    pub average_time_hours: f64,
    /// Keyed by goal-rule label (or the raw service type when unmapped)
    pub by_category: BTreeMap<String, CategoryTimeStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTimeStats {
    pub count: usize,
    pub within_goal_count: usize,
    pub percent_within_goal: f64,
    pub average_time_hours: f64,
    pub goal_hours: f64,
}

// ============================================================================
// Reopening Metrics
// ============================================================================

/// Reopening KPIs and their breakdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReopeningMetrics {
    pub reopened_count: usize,
    /// Eligible orders of an original type (denominator of the rate)
    pub total_originals: usize,
    /// reopenings / originals, 0..=1
    pub reopening_rate: f64,
    pub average_hours_between: f64,
    /// Original-type label the headline numbers were narrowed to, if any
    pub applied_original_type: Option<String>,

    pub by_technician: BTreeMap<String, usize>,
    pub by_category: BTreeMap<ServiceCategory, usize>,
    pub by_city: BTreeMap<String, usize>,
    pub by_neighborhood: BTreeMap<String, usize>,
    pub by_original_type: BTreeMap<String, OriginalTypeStats>,
    pub by_reason: BTreeMap<String, ReasonBreakdown>,

    pub pairs: Vec<PairRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalTypeStats {
    pub reopenings: usize,
    pub total_originals: usize,
    pub reopening_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonBreakdown {
    pub by_original_type: BTreeMap<String, usize>,
    pub total: usize,
}

/// Owned snapshot of a reopening pair, for drill-down tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRecord {
    pub original_code: String,
    pub reopening_code: String,
    pub client_code: String,
    pub original_type: String,
    pub original_category: ServiceCategory,
    pub reopening_category: ServiceCategory,
    pub hours_between: f64,
    pub days_between: f64,
}

// ============================================================================
// Data Quality Tallies
// ============================================================================

/// Malformed records skipped by the eligibility filter.
///
/// Surfaced to the UI as an "N records skipped" notice; never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyTally {
    pub missing_created_at: usize,
    pub missing_finalized_at: usize,
    pub finalized_before_created: usize,
}

impl AnomalyTally {
    pub fn total(&self) -> usize {
        self.missing_created_at + self.missing_finalized_at + self.finalized_before_created
    }
}

/// Orders dropped by the business-rule checks (not data quality).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionTally {
    pub invalid_status: usize,
    pub invalid_subtype: usize,
    pub excluded_reason: usize,
    /// Most frequent rejection, formatted for logs
    pub primary_reason: Option<String>,
}

impl RejectionTally {
    pub fn total(&self) -> usize {
        self.invalid_status + self.invalid_subtype + self.excluded_reason
    }
}

// ============================================================================
// Facade Output
// ============================================================================

/// Everything the facade hands back for one filter window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub time: TimeMetrics,
    pub reopening: ReopeningMetrics,
    pub anomalies: AnomalyTally,
    pub rejections: RejectionTally,
    /// Orders that passed the business rules (shown in tables)
    pub retained_orders: usize,
    /// Retained orders that also feed the metrics engines
    pub eligible_orders: usize,
}

impl MetricsReport {
    /// All-zero report with no breakdown buckets.
    pub fn empty() -> Self {
        Self::default()
    }
}
