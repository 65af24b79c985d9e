//! Month/year window applied on `finalized_at` before eligibility

use chrono::{Datelike, NaiveDateTime};

use super::MetricsError;
use crate::normalize;
use crate::types::{FilterContext, ServiceOrder};

/// Picker values meaning "no restriction".
const ANY_PERIOD: &[&str] = &["", "all", "todos", "todas"];

/// Parsed month/year selection. `None` on either side leaves it open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

fn picker_value(raw: Option<&str>) -> Option<String> {
    let folded = normalize::fold(raw?);
    if ANY_PERIOD.contains(&folded.as_str()) {
        None
    } else {
        Some(folded)
    }
}

impl Period {
    pub fn from_context(ctx: &FilterContext) -> Result<Self, MetricsError> {
        let month = match picker_value(ctx.selected_month.as_deref()) {
            None => None,
            Some(value) => match value.parse::<u32>() {
                Ok(m) if (1..=12).contains(&m) && value.len() <= 2 => Some(m),
                _ => {
                    return Err(MetricsError::InvalidPeriod {
                        field: "month",
                        value,
                    })
                }
            },
        };

        let year = match picker_value(ctx.selected_year.as_deref()) {
            None => None,
            Some(value) => match value.parse::<i32>() {
                Ok(y) if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) => Some(y),
                _ => {
                    return Err(MetricsError::InvalidPeriod {
                        field: "year",
                        value,
                    })
                }
            },
        };

        Ok(Self { month, year })
    }

    pub fn is_unbounded(&self) -> bool {
        self.month.is_none() && self.year.is_none()
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.month.map_or(true, |m| at.month() == m) && self.year.map_or(true, |y| at.year() == y)
    }
}

/// Orders finalized inside the period, in input order.
///
/// With a bounded period, orders that were never finalized cannot be placed
/// in it and are dropped. An unbounded period keeps everything.
pub fn filter_by_period<'a>(orders: &'a [ServiceOrder], period: &Period) -> Vec<&'a ServiceOrder> {
    if period.is_unbounded() {
        return orders.iter().collect();
    }
    orders
        .iter()
        .filter(|o| o.finalized_at.is_some_and(|at| period.contains(at)))
        .collect()
}
