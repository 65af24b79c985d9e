//! Reopening Aggregator: rate and breakdowns over the detected pairs

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::pairing::ReopeningPair;
use super::prepared::{OriginalTypes, PreparedOrder};
use super::{mean, ratio};
use crate::config::defaults::{UNKNOWN_DIMENSION_LABEL, UNSPECIFIED_REASON_LABEL};
use crate::types::{OriginalTypeStats, ReasonBreakdown, ReopeningMetrics};

/// Counts grouped on a folded key, displayed under the first label seen.
#[derive(Default)]
struct LabeledCounts<T> {
    buckets: BTreeMap<String, (String, T)>,
}

impl<T: Default> LabeledCounts<T> {
    fn entry(&mut self, key: &str, raw: &str, fallback: &str) -> &mut T {
        let (_, value) = self.buckets.entry(key.to_string()).or_insert_with(|| {
            let trimmed = raw.trim();
            let label = if key.is_empty() || trimmed.is_empty() { fallback } else { trimmed };
            (label.to_string(), T::default())
        });
        value
    }

    fn into_labeled(self) -> BTreeMap<String, T> {
        self.buckets.into_values().collect()
    }
}

fn bump(counts: &mut LabeledCounts<usize>, key: &str, raw: &str) {
    *counts.entry(key, raw, UNKNOWN_DIMENSION_LABEL) += 1;
}

/// Build `ReopeningMetrics` from the pairs of one pairing pass.
///
/// `eligible` is the same set the pairs were detected on; it supplies the
/// original-order denominators. Breakdowns always cover every pair.
pub fn aggregate_reopenings(
    pairs: &[ReopeningPair<'_>],
    eligible: &[&PreparedOrder<'_>],
    original_types: &OriginalTypes,
) -> ReopeningMetrics {
    debug_assert!(
        {
            let mut seen = HashSet::new();
            pairs.iter().all(|p| seen.insert(p.reopening.code.as_str()))
        },
        "an order was claimed as a reopening more than once"
    );

    let mut originals_by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for order in eligible {
        if let Some(label) = order.original_type.as_deref() {
            *originals_by_type.entry(label).or_insert(0) += 1;
        }
    }
    let total_originals: usize = originals_by_type.values().sum();

    let mut metrics = ReopeningMetrics {
        reopened_count: pairs.len(),
        total_originals,
        reopening_rate: ratio(pairs.len(), total_originals),
        average_hours_between: mean(&pairs.iter().map(|p| p.hours_between).collect::<Vec<_>>()),
        ..ReopeningMetrics::default()
    };

    // Every configured type gets a bucket, even with no originals
    for label in original_types.labels() {
        metrics.by_original_type.insert(
            label.to_string(),
            OriginalTypeStats {
                total_originals: originals_by_type.get(label).copied().unwrap_or(0),
                ..OriginalTypeStats::default()
            },
        );
    }

    let mut by_technician = LabeledCounts::default();
    let mut by_city = LabeledCounts::default();
    let mut by_neighborhood = LabeledCounts::default();
    let mut by_reason: LabeledCounts<ReasonBreakdown> = LabeledCounts::default();

    for pair in pairs {
        let reopening = pair.reopening;
        let keys = &pair.reopening_dimensions;

        bump(&mut by_technician, &keys.technician, reopening.technician_label());
        bump(&mut by_city, &keys.city, &reopening.city);
        bump(&mut by_neighborhood, &keys.neighborhood, &reopening.neighborhood);
        *metrics.by_category.entry(pair.reopening_category).or_insert(0) += 1;

        metrics
            .by_original_type
            .entry(pair.original_type.clone())
            .or_default()
            .reopenings += 1;

        let reason = by_reason.entry(&pair.reopening_reason_key, &reopening.reason, UNSPECIFIED_REASON_LABEL);
        *reason.by_original_type.entry(pair.original_type.clone()).or_insert(0) += 1;
        reason.total += 1;

        metrics.pairs.push(pair.to_record());
    }

    metrics.by_technician = by_technician.into_labeled();
    metrics.by_city = by_city.into_labeled();
    metrics.by_neighborhood = by_neighborhood.into_labeled();
    metrics.by_reason = by_reason.into_labeled();

    for stats in metrics.by_original_type.values_mut() {
        stats.reopening_rate = ratio(stats.reopenings, stats.total_originals);
    }

    debug!(
        reopened = metrics.reopened_count,
        originals = metrics.total_originals,
        rate = metrics.reopening_rate,
        "Reopening metrics aggregated"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KpiConfig;
    use crate::metrics::pairing::find_reopenings;
    use crate::metrics::prepared::OrderPreparer;
    use crate::types::{ServiceCategory, ServiceOrder};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn day(n: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(10, 0, 0).unwrap() + Duration::days(n)
    }

    fn make_order(code: &str, client: &str, service_type: &str, subtype: &str, created: i64, finalized: i64) -> ServiceOrder {
        ServiceOrder {
            code: code.to_string(),
            client_code: client.to_string(),
            status: "Finalizada".to_string(),
            service_type: service_type.to_string(),
            service_subtype: subtype.to_string(),
            city: "Natal".to_string(),
            neighborhood: "Tirol".to_string(),
            street: Some("Rua das Flores".to_string()),
            street_number: Some("12".to_string()),
            technician_name: "Joana".to_string(),
            created_at: Some(day(created)),
            finalized_at: Some(day(finalized)),
            ..Default::default()
        }
    }

    fn aggregate(raw: &[ServiceOrder]) -> ReopeningMetrics {
        let config = KpiConfig::default();
        let preparer = OrderPreparer::new(&config);
        let prepared = preparer.prepare_all(raw);
        let refs: Vec<&PreparedOrder> = prepared.iter().collect();
        let pairs = find_reopenings(&refs, config.reopening.window_days);
        aggregate_reopenings(&pairs, &refs, preparer.original_types())
    }

    #[test]
    fn test_no_pairs_and_no_originals_is_all_zero() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics.reopened_count, 0);
        assert_eq!(metrics.reopening_rate, 0.0);
        assert_eq!(metrics.average_hours_between, 0.0);
        assert!(metrics.pairs.is_empty());
        // Configured types still get an empty bucket
        assert_eq!(metrics.by_original_type["Corretiva"].reopening_rate, 0.0);
        assert_eq!(metrics.by_original_type.len(), 2);
    }

    #[test]
    fn test_rate_uses_eligible_originals_as_denominator() {
        let mut reopening = make_order("OS-2", "C1", "Ponto Adicional", "Ponto Adicional TV", 3, 3);
        reopening.reason = "Sinal fraco".to_string();
        let metrics = aggregate(&[
            make_order("OS-1", "C1", "Corretiva", "Corretiva Fibra", 0, 1),
            reopening,
            make_order("OS-3", "C2", "Corretiva", "Corretiva Fibra", 0, 1),
            make_order("OS-4", "C3", "Ponto Principal", "Ponto Principal TV", 0, 1),
        ]);

        assert_eq!(metrics.reopened_count, 1);
        assert_eq!(metrics.total_originals, 3);
        assert!((metrics.reopening_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.average_hours_between, 48.0);

        let corretiva = &metrics.by_original_type["Corretiva"];
        assert_eq!(corretiva.reopenings, 1);
        assert_eq!(corretiva.total_originals, 2);
        assert_eq!(corretiva.reopening_rate, 0.5);
        assert_eq!(metrics.by_original_type["Ponto Principal"].reopenings, 0);

        assert_eq!(metrics.by_category[&ServiceCategory::Tv], 1);
        assert_eq!(metrics.by_technician["Joana"], 1);
        assert_eq!(metrics.by_city["Natal"], 1);
        assert_eq!(metrics.by_neighborhood["Tirol"], 1);

        let reason = &metrics.by_reason["Sinal fraco"];
        assert_eq!(reason.total, 1);
        assert_eq!(reason.by_original_type["Corretiva"], 1);
    }

    #[test]
    fn test_blank_dimensions_get_placeholder_labels() {
        let mut reopening = make_order("OS-2", "C1", "Corretiva", "Corretiva TV", 2, 2);
        reopening.city = "  ".to_string();
        reopening.neighborhood = String::new();
        reopening.technician_name = String::new();
        let metrics = aggregate(&[make_order("OS-1", "C1", "Corretiva", "Corretiva TV", 0, 1), reopening]);

        assert_eq!(metrics.by_reason[UNSPECIFIED_REASON_LABEL].total, 1);
        assert_eq!(metrics.by_technician[UNKNOWN_DIMENSION_LABEL], 1);
        assert_eq!(metrics.by_city.len(), 1);
    }

    #[test]
    fn test_spelling_variants_share_one_bucket() {
        let mut first = make_order("OS-2", "C1", "Corretiva", "Corretiva TV", 2, 3);
        first.reason = "Sem sinal".to_string();
        let mut second = make_order("OS-3", "C1", "Corretiva", "Corretiva TV", 4, 5);
        second.reason = "  SEM SINAL".to_string();
        second.city = "NATAL".to_string();
        second.neighborhood = "Tírol".to_string();
        second.technician_name = "joana".to_string();
        let metrics = aggregate(&[make_order("OS-1", "C1", "Corretiva", "Corretiva TV", 0, 1), first, second]);

        assert_eq!(metrics.reopened_count, 2);
        assert_eq!(metrics.by_reason.len(), 1);
        assert_eq!(metrics.by_reason["Sem sinal"].total, 2);
        assert_eq!(metrics.by_city.len(), 1);
        assert_eq!(metrics.by_city["Natal"], 2);
        assert_eq!(metrics.by_neighborhood["Tirol"], 2);
        assert_eq!(metrics.by_technician["Joana"], 2);
    }

    #[test]
    fn test_reason_total_sums_sub_groups() {
        let mut second = make_order("OS-2", "C1", "Corretiva", "Corretiva TV", 2, 3);
        second.reason = "Sem sinal".to_string();
        let mut third = make_order("OS-3", "C1", "Ponto Adicional", "Ponto Adicional TV", 4, 4);
        third.reason = "Sem sinal".to_string();
        let metrics = aggregate(&[
            make_order("OS-1", "C1", "Ponto Principal", "Ponto Principal TV", 0, 1),
            second,
            third,
        ]);

        let reason = &metrics.by_reason["Sem sinal"];
        assert_eq!(reason.total, 2);
        assert_eq!(reason.by_original_type["Ponto Principal"], 1);
        assert_eq!(reason.by_original_type["Corretiva"], 1);
        assert_eq!(reason.by_original_type.values().sum::<usize>(), reason.total);
    }
}
