//! Eligibility Filter for KPI computation
//!
//! Decides which orders participate in metrics. Rejects:
//! - Status labels outside the completed-visit whitelist
//! - Subtypes outside the configured scope
//! - Orders closed with an excluded reason (customer absent, duplicate, ...)
//!
//! Orders that pass those rules but carry broken timestamps stay in the
//! retained set (tables still show them) with `include_in_metrics = false`,
//! and are counted in the anomaly tally.

use std::collections::HashSet;

use super::prepared::PreparedOrder;
use crate::config::EligibilityConfig;
use crate::normalize;
use crate::types::{AnomalyTally, RejectionTally};

/// Folded whitelists / blacklists, built once per computation.
#[derive(Debug, Clone, Default)]
pub struct EligibilityRules {
    valid_statuses: HashSet<String>,
    /// Empty set means every subtype is in scope
    valid_subtypes: HashSet<String>,
    excluded_reasons: HashSet<String>,
}

impl EligibilityRules {
    pub fn from_config(config: &EligibilityConfig) -> Self {
        Self::new(&config.valid_statuses, &config.valid_subtypes, &config.excluded_reasons)
    }

    pub fn new(valid_statuses: &[String], valid_subtypes: &[String], excluded_reasons: &[String]) -> Self {
        Self {
            valid_statuses: normalize::fold_all(valid_statuses).into_iter().collect(),
            valid_subtypes: normalize::fold_all(valid_subtypes).into_iter().collect(),
            excluded_reasons: normalize::fold_all(excluded_reasons).into_iter().collect(),
        }
    }
}

/// Why an order was dropped by the business rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    InvalidStatus,
    InvalidSubtype,
    ExcludedReason,
}

/// Data-quality problem that keeps a retained order out of the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    MissingCreatedAt,
    MissingFinalizedAt,
    FinalizedBeforeCreated,
}

/// A retained order and whether it feeds the metrics engines.
#[derive(Debug, Clone)]
pub struct ScreenedOrder<'p, 'a> {
    pub order: &'p PreparedOrder<'a>,
    pub include_in_metrics: bool,
    pub anomaly: Option<Anomaly>,
}

/// Result of eligibility filtering
#[derive(Debug, Clone, Default)]
pub struct FilterResult<'p, 'a> {
    /// Orders passing the business rules, in input order
    pub retained: Vec<ScreenedOrder<'p, 'a>>,
    pub anomalies: AnomalyTally,
    pub rejections: RejectionTally,
}

impl<'p, 'a> FilterResult<'p, 'a> {
    /// Retained orders with `include_in_metrics = true`, in input order.
    pub fn eligible(&self) -> Vec<&'p PreparedOrder<'a>> {
        self.retained
            .iter()
            .filter(|s| s.include_in_metrics)
            .map(|s| s.order)
            .collect()
    }
}

/// Eligibility filter for metrics computation
pub struct EligibilityFilter;

impl EligibilityFilter {
    /// Screen orders against the rules. Input is never modified.
    pub fn filter<'p, 'a>(orders: &'p [PreparedOrder<'a>], rules: &EligibilityRules) -> FilterResult<'p, 'a> {
        let mut result = FilterResult::default();

        for order in orders {
            if let Err(reason) = Self::check_rules(order, rules) {
                match reason {
                    RejectionReason::InvalidStatus => result.rejections.invalid_status += 1,
                    RejectionReason::InvalidSubtype => result.rejections.invalid_subtype += 1,
                    RejectionReason::ExcludedReason => result.rejections.excluded_reason += 1,
                }
                continue;
            }

            let anomaly = Self::check_timestamps(order).err();
            match anomaly {
                Some(Anomaly::MissingCreatedAt) => result.anomalies.missing_created_at += 1,
                Some(Anomaly::MissingFinalizedAt) => result.anomalies.missing_finalized_at += 1,
                Some(Anomaly::FinalizedBeforeCreated) => result.anomalies.finalized_before_created += 1,
                None => {}
            }
            result.retained.push(ScreenedOrder {
                order,
                include_in_metrics: anomaly.is_none(),
                anomaly,
            });
        }

        result.rejections.primary_reason = Self::primary_reason(&result.rejections);
        result
    }

    /// Business-rule checks, in the order they are reported
    fn check_rules(order: &PreparedOrder<'_>, rules: &EligibilityRules) -> Result<(), RejectionReason> {
        if !rules.valid_statuses.contains(&order.status_key) {
            return Err(RejectionReason::InvalidStatus);
        }

        if !rules.valid_subtypes.is_empty() && !rules.valid_subtypes.contains(&order.subtype_key) {
            return Err(RejectionReason::InvalidSubtype);
        }

        if !order.reason_key.is_empty() && rules.excluded_reasons.contains(&order.reason_key) {
            return Err(RejectionReason::ExcludedReason);
        }

        Ok(())
    }

    fn check_timestamps(order: &PreparedOrder<'_>) -> Result<(), Anomaly> {
        let created = order.order.created_at.ok_or(Anomaly::MissingCreatedAt)?;
        let finalized = order.order.finalized_at.ok_or(Anomaly::MissingFinalizedAt)?;
        if finalized < created {
            return Err(Anomaly::FinalizedBeforeCreated);
        }
        Ok(())
    }

    fn primary_reason(tally: &RejectionTally) -> Option<String> {
        [
            (tally.invalid_status, "Status outside whitelist"),
            (tally.invalid_subtype, "Subtype out of scope"),
            (tally.excluded_reason, "Excluded closure reason"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .max_by_key(|(count, _)| *count)
        .map(|(count, reason)| format!("{reason} ({count} orders)"))
    }
}
