//! Category goal table lookup

use crate::config::SlaConfig;
use crate::normalize;
use crate::types::ServiceCategory;

/// Label used when an unmapped order has no service type at all.
const UNCATEGORIZED_LABEL: &str = "Sem categoria";

#[derive(Debug, Clone)]
struct GoalEntry {
    type_key: String,
    category: Option<ServiceCategory>,
    label: String,
    goal_hours: f64,
}

/// Goal resolved for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGoal {
    pub label: String,
    pub goal_hours: f64,
    /// False when the default goal was applied
    pub mapped: bool,
}

/// Folded view of `SlaConfig` for per-order lookups.
#[derive(Debug, Clone)]
pub struct GoalTable {
    entries: Vec<GoalEntry>,
    default_goal_hours: f64,
}

impl GoalTable {
    pub fn from_config(config: &SlaConfig) -> Self {
        let mut entries: Vec<GoalEntry> = config
            .goals
            .iter()
            .map(|rule| GoalEntry {
                type_key: normalize::fold(&rule.service_type),
                category: rule.category,
                label: rule.label.trim().to_string(),
                goal_hours: rule.goal_hours,
            })
            .collect();
        // Category-specific rules are consulted before type-wide ones
        entries.sort_by_key(|e| e.category.is_none());
        Self {
            entries,
            default_goal_hours: config.default_goal_hours,
        }
    }

    pub fn default_goal_hours(&self) -> f64 {
        self.default_goal_hours
    }

    /// Resolve the goal for a folded service type and its category.
    ///
    /// Unmapped combinations fall back to the default goal and are bucketed
    /// under their raw service type.
    pub fn resolve(&self, type_key: &str, category: ServiceCategory, raw_type: &str) -> ResolvedGoal {
        let hit = self
            .entries
            .iter()
            .find(|e| e.type_key == type_key && e.category.map_or(true, |c| c == category));

        match hit {
            Some(entry) => ResolvedGoal {
                label: entry.label.clone(),
                goal_hours: entry.goal_hours,
                mapped: true,
            },
            None => {
                let raw = raw_type.trim();
                ResolvedGoal {
                    label: if raw.is_empty() { UNCATEGORIZED_LABEL.to_string() } else { raw.to_string() },
                    goal_hours: self.default_goal_hours,
                    mapped: false,
                }
            }
        }
    }
}
