//! KPI computation over service orders
//!
//! [`compute_metrics`] is the single entry point. Per call it runs:
//!
//! ```text
//! orders ──period──> prepared ──eligibility──┬──> time metrics
//!                                            └──> pairing ──> aggregation
//! ```
//!
//! Each call is a pure transform of `orders × context × config`. Nothing is
//! cached between calls, so independent filter windows can be evaluated in
//! parallel with [`compute_metrics_for_windows`].

pub mod aggregation;
pub mod eligibility;
pub mod goals;
pub mod pairing;
pub mod period;
pub mod prepared;
pub mod time;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::KpiConfig;
use crate::types::{FilterContext, MetricsReport, ReopeningMetrics, ServiceOrder};

use self::eligibility::{EligibilityFilter, EligibilityRules};
use self::goals::GoalTable;
use self::period::Period;
use self::prepared::{OrderPreparer, OriginalTypes};

/// Errors from the metrics facade
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Invalid {field} selection: {value:?}")]
    InvalidPeriod { field: &'static str, value: String },
}

/// `part / total × 100`, 0 when `total` is 0.
pub(crate) fn percent(part: usize, total: usize) -> f64 {
    ratio(part, total) * 100.0
}

/// `part / total`, 0 when `total` is 0.
pub(crate) fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Arithmetic mean, 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Compute time and reopening KPIs for one filter window.
///
/// Returns all-zero aggregates without running the engines when the caller
/// hides data or passes no orders. The only error is an unparseable
/// month/year selection; data problems end up in the report tallies.
pub fn compute_metrics(
    orders: &[ServiceOrder],
    ctx: &FilterContext,
    config: &KpiConfig,
) -> Result<MetricsReport, MetricsError> {
    let preparer = OrderPreparer::new(config);

    if !ctx.show_data || orders.is_empty() {
        debug!(show_data = ctx.show_data, orders = orders.len(), "Metrics short-circuit");
        return Ok(empty_report(ctx, preparer.original_types()));
    }

    let selected = Period::from_context(ctx)?;
    let in_period = period::filter_by_period(orders, &selected);

    let prepared = preparer.prepare_all(in_period.iter().copied());

    let screened = EligibilityFilter::filter(&prepared, &EligibilityRules::from_config(&config.eligibility));
    let eligible = screened.eligible();

    // Time metrics
    let goals = GoalTable::from_config(&config.sla);
    let time = time::compute_time_metrics(&eligible, &goals);

    // Reopenings
    let pairs = pairing::find_reopenings(&eligible, config.reopening.window_days);
    let mut reopening = aggregation::aggregate_reopenings(&pairs, &eligible, preparer.original_types());
    narrow_to_original_type(&mut reopening, ctx, preparer.original_types());

    if screened.anomalies.total() > 0 {
        warn!(
            skipped = screened.anomalies.total(),
            missing_created_at = screened.anomalies.missing_created_at,
            missing_finalized_at = screened.anomalies.missing_finalized_at,
            finalized_before_created = screened.anomalies.finalized_before_created,
            "Malformed orders kept out of metrics"
        );
    }
    if let Some(reason) = &screened.rejections.primary_reason {
        debug!(rejected = screened.rejections.total(), primary = %reason, "Orders rejected by eligibility rules");
    }

    info!(
        input = orders.len(),
        in_period = in_period.len(),
        eligible = eligible.len(),
        within_goal = time.orders_within_goal,
        reopenings = reopening.reopened_count,
        "Metrics computed"
    );

    Ok(MetricsReport {
        time,
        reopening,
        anomalies: screened.anomalies,
        retained_orders: screened.retained.len(),
        eligible_orders: eligible.len(),
        rejections: screened.rejections,
    })
}

/// All-zero report shaped like a computed run with no eligible orders.
///
/// Every configured original type keeps its zero bucket.
fn empty_report(ctx: &FilterContext, original_types: &OriginalTypes) -> MetricsReport {
    let mut reopening = aggregation::aggregate_reopenings(&[], &[], original_types);
    narrow_to_original_type(&mut reopening, ctx, original_types);
    MetricsReport {
        reopening,
        ..MetricsReport::empty()
    }
}

/// Narrow the headline reopening numbers to one original type.
///
/// Breakdown maps keep covering every pair.
fn narrow_to_original_type(metrics: &mut ReopeningMetrics, ctx: &FilterContext, original_types: &OriginalTypes) {
    let Some(key) = ctx.original_type_key() else {
        return;
    };

    let Some(label) = original_types.label_for_key(&key) else {
        warn!(
            filter = %ctx.original_service_type_filter,
            "Original-type filter matches no configured type"
        );
        metrics.reopened_count = 0;
        metrics.total_originals = 0;
        metrics.reopening_rate = 0.0;
        metrics.applied_original_type = Some(ctx.original_service_type_filter.trim().to_string());
        return;
    };

    let bucket = metrics.by_original_type.get(label).cloned().unwrap_or_default();
    metrics.reopened_count = bucket.reopenings;
    metrics.total_originals = bucket.total_originals;
    metrics.reopening_rate = bucket.reopening_rate;
    metrics.applied_original_type = Some(label.to_string());
}

/// Evaluate several independent filter windows in parallel.
///
/// Results are returned in the order of `contexts`. Fails on the first
/// window with an invalid period.
pub fn compute_metrics_for_windows(
    orders: &[ServiceOrder],
    contexts: &[FilterContext],
    config: &KpiConfig,
) -> Result<Vec<MetricsReport>, MetricsError> {
    contexts
        .par_iter()
        .map(|ctx| compute_metrics(orders, ctx, config))
        .collect()
}
