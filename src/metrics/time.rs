//! Time Metrics Calculator: completion time against category goals

use std::collections::BTreeMap;

use tracing::debug;

use super::goals::GoalTable;
use super::prepared::PreparedOrder;
use super::{mean, percent};
use crate::types::{CategoryTimeStats, ServiceOrder, TimeMetrics};

/// Derived timing for one eligible order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTiming<'a> {
    pub order: &'a ServiceOrder,
    pub category_label: String,
    /// Full precision; round only for display
    pub service_time_hours: f64,
    pub goal_hours: f64,
    /// Inclusive: finishing exactly on the goal counts as within goal
    pub within_goal: bool,
}

/// Compute the timing of one order, `None` if its timestamps are unusable.
pub fn evaluate_order<'a>(order: &PreparedOrder<'a>, goals: &GoalTable) -> Option<OrderTiming<'a>> {
    let hours = order.order.service_time_hours()?;
    if hours < 0.0 {
        return None;
    }
    let goal = goals.resolve(&order.type_key, order.category, &order.order.service_type);
    if !goal.mapped {
        debug!(
            code = %order.code(),
            service_type = %order.order.service_type,
            category = %order.category,
            "Unmapped category, using default goal"
        );
    }
    Some(OrderTiming {
        order: order.order,
        category_label: goal.label,
        service_time_hours: hours,
        goal_hours: goal.goal_hours,
        within_goal: hours <= goal.goal_hours,
    })
}

#[derive(Default)]
struct CategoryAccumulator {
    count: usize,
    within: usize,
    hours: Vec<f64>,
    goal_hours: f64,
}

/// Aggregate SLA compliance over the eligible set.
///
/// Empty input yields all-zero metrics with an empty category map.
pub fn compute_time_metrics(eligible: &[&PreparedOrder<'_>], goals: &GoalTable) -> TimeMetrics {
    let mut by_category: BTreeMap<String, CategoryAccumulator> = BTreeMap::new();
    let mut all_hours = Vec::with_capacity(eligible.len());
    let mut within = 0usize;

    for order in eligible {
        let Some(timing) = evaluate_order(order, goals) else {
            debug_assert!(
                order.order.service_time_hours().is_some_and(|h| h >= 0.0),
                "eligible order {} has unusable timestamps",
                order.code()
            );
            continue;
        };

        let acc = by_category.entry(timing.category_label).or_default();
        acc.count += 1;
        acc.goal_hours = timing.goal_hours;
        acc.hours.push(timing.service_time_hours);
        if timing.within_goal {
            acc.within += 1;
            within += 1;
        }
        all_hours.push(timing.service_time_hours);
    }

    let total = all_hours.len();
    let metrics = TimeMetrics {
        total_orders: total,
        orders_within_goal: within,
        orders_outside_goal: total - within,
        percent_within_goal: percent(within, total),
        average_time_hours: mean(&all_hours),
        by_category: by_category
            .into_iter()
            .map(|(label, acc)| {
                let stats = CategoryTimeStats {
                    count: acc.count,
                    within_goal_count: acc.within,
                    percent_within_goal: percent(acc.within, acc.count),
                    average_time_hours: mean(&acc.hours),
                    goal_hours: acc.goal_hours,
                };
                (label, stats)
            })
            .collect(),
    };

    debug!(
        orders = metrics.total_orders,
        within_goal = metrics.orders_within_goal,
        categories = metrics.by_category.len(),
        "Time metrics computed"
    );
    metrics
}
