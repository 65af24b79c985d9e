//! Reopening Pairing Engine
//!
//! Links an "original" order to the next order at the same installation
//! point that was opened within the reopening window after the original
//! was finalized.
//!
//! ## Algorithm
//!
//! 1. Partition eligible orders by `LinkageKey` (client + location).
//! 2. Sort each partition by `(finalized_at | created_at, created_at, code)`.
//! 3. Visit originals in that order. Each scans forward and claims the
//!    unconsumed later order with the smallest `(created_at, code)` such
//!    that `finalized_at <= created_at <= finalized_at + window`.
//!    Scanning forward only keeps chains a path: two zero-duration orders
//!    at the same instant pair once, never both ways.
//! 4. A claimed order is consumed as a reopening but can still open its own
//!    pair, so chains A→B→C yield two pairs.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use super::prepared::{DimensionKeys, LinkageKey, PreparedOrder};
use crate::types::{hours_between, PairRecord, ServiceCategory, ServiceOrder};

/// Link between an original order and the order that reopened it.
///
/// Both orders stay owned by the input collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReopeningPair<'a> {
    pub original: &'a ServiceOrder,
    pub reopening: &'a ServiceOrder,
    /// From `original.finalized_at` to `reopening.created_at`
    pub hours_between: f64,
    pub days_between: f64,
    pub original_category: ServiceCategory,
    pub reopening_category: ServiceCategory,
    /// Configured original-type label of the original order
    pub original_type: String,
    /// Folded breakdown keys of the reopening order
    pub reopening_reason_key: String,
    pub reopening_dimensions: DimensionKeys,
}

impl ReopeningPair<'_> {
    pub fn to_record(&self) -> PairRecord {
        PairRecord {
            original_code: self.original.code.clone(),
            reopening_code: self.reopening.code.clone(),
            client_code: self.original.client_code.trim().to_string(),
            original_type: self.original_type.clone(),
            original_category: self.original_category,
            reopening_category: self.reopening_category,
            hours_between: self.hours_between,
            days_between: self.days_between,
        }
    }
}

fn sort_key<'o>(order: &'o PreparedOrder<'_>) -> (Option<NaiveDateTime>, Option<NaiveDateTime>, &'o str) {
    let o = order.order;
    (o.finalized_at.or(o.created_at), o.created_at, o.code.as_str())
}

/// Detect reopenings among eligible orders.
///
/// Orders that are not in `eligible` never participate. Output is ordered
/// by partition, then by the original's position in its partition, and is
/// identical across repeated calls on the same input.
pub fn find_reopenings<'a>(eligible: &[&PreparedOrder<'a>], window_days: u32) -> Vec<ReopeningPair<'a>> {
    let window = Duration::days(i64::from(window_days));

    let mut partitions: BTreeMap<&LinkageKey, Vec<&PreparedOrder<'a>>> = BTreeMap::new();
    for &order in eligible {
        partitions.entry(&order.linkage).or_default().push(order);
    }

    let mut pairs = Vec::new();
    for members in partitions.values_mut() {
        members.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        pair_partition(members, window, &mut pairs);
    }

    debug!(
        partitions = partitions.len(),
        orders = eligible.len(),
        pairs = pairs.len(),
        window_days,
        "Reopening pairing complete"
    );
    pairs
}

fn pair_partition<'a>(members: &[&PreparedOrder<'a>], window: Duration, pairs: &mut Vec<ReopeningPair<'a>>) {
    let mut consumed = vec![false; members.len()];
    // Index of the original that claimed each member
    let mut claimed_by: Vec<Option<usize>> = vec![None; members.len()];

    for (i, original) in members.iter().enumerate() {
        let Some(original_type) = original.original_type.as_deref() else {
            continue;
        };
        // Unfinished orders can be reopenings but never originals
        let Some(finalized) = original.order.finalized_at else {
            continue;
        };
        let deadline = finalized + window;

        let mut best: Option<(usize, NaiveDateTime)> = None;
        for (j, candidate) in members.iter().enumerate().skip(i + 1) {
            if consumed[j] {
                continue;
            }
            let Some(created) = candidate.order.created_at else {
                continue;
            };
            if created < finalized || created > deadline {
                continue;
            }
            let better = match best {
                None => true,
                Some((b, b_created)) => {
                    (created, candidate.code()) < (b_created, members[b].code())
                }
            };
            if better {
                best = Some((j, created));
            }
        }

        let Some((j, created)) = best else {
            // Resolved: nothing came back within the window
            continue;
        };
        debug_assert!(
            claimed_by[i] != Some(j),
            "pair {} -> {} would close a cycle",
            original.code(),
            members[j].code()
        );
        consumed[j] = true;
        claimed_by[j] = Some(i);

        let reopening = members[j];
        let hours = hours_between(finalized, created);
        debug_assert!(
            hours >= 0.0 && hours <= window.num_hours() as f64,
            "pair {} -> {} spans {hours} h, outside the {} h window",
            original.code(),
            reopening.code(),
            window.num_hours()
        );

        pairs.push(ReopeningPair {
            original: original.order,
            reopening: reopening.order,
            hours_between: hours,
            days_between: hours / 24.0,
            original_category: original.category,
            reopening_category: reopening.category,
            original_type: original_type.to_string(),
            reopening_reason_key: reopening.reason_key.clone(),
            reopening_dimensions: reopening.dimensions.clone(),
        });
    }
}
