//! KPI Configuration - business rules as operator-tunable TOML values
//!
//! Status whitelists, goal tables, original service types and the reopening
//! window change with every contract renegotiation, so none of them are
//! compiled into the engine. Each struct implements `Default` with the
//! values the operations team currently uses, so a missing config file
//! still produces sensible numbers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults::{
    CONFIG_ENV_VAR, DEFAULT_GOAL_HOURS, DEFAULT_REOPENING_WINDOW_DAYS, LOCAL_CONFIG_FILE,
    MAX_GOAL_HOURS, MAX_REOPENING_WINDOW_DAYS,
};
use crate::normalize;
use crate::types::ServiceCategory;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one tenant / operation.
///
/// Load with `KpiConfig::load()` which searches:
/// 1. `$FIELDOPS_KPI_CONFIG` env var
/// 2. `./kpi_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiConfig {
    /// Which orders participate in metrics
    #[serde(default)]
    pub eligibility: EligibilityConfig,

    /// Category goal table
    #[serde(default)]
    pub sla: SlaConfig,

    /// Reopening detection rules
    #[serde(default)]
    pub reopening: ReopeningConfig,

    /// Subtype keywords for the TV / Fibra split
    #[serde(default)]
    pub categories: CategoryConfig,
}

impl KpiConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FIELDOPS_KPI_CONFIG` environment variable
    /// 2. `./kpi_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded KPI config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded KPI config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only produce warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        for w in super::validation::validate_plausibility(&config) {
            warn!(field = %w.field, "{}", w);
        }
        Ok(config)
    }

    /// Serialize the effective configuration back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all rules for internal consistency.
    ///
    /// Rules:
    /// - Goal hours must be finite, positive and at most 90 days
    /// - Reopening window must be 1..=365 days
    /// - At least one original service type and one valid status
    /// - Goal rules must not repeat the same (type, category) pair
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_goal_hours(self.sla.default_goal_hours, "sla.default_goal_hours", &mut errors);

        let mut seen = HashSet::new();
        for (i, rule) in self.sla.goals.iter().enumerate() {
            let name = format!("sla.goals[{i}] ({})", rule.label);
            Self::check_goal_hours(rule.goal_hours, &name, &mut errors);
            if normalize::fold(&rule.service_type).is_empty() {
                errors.push(format!("{name}: service_type must not be empty"));
            }
            if rule.label.trim().is_empty() {
                errors.push(format!("sla.goals[{i}]: label must not be empty"));
            }
            if !seen.insert((normalize::fold(&rule.service_type), rule.category)) {
                errors.push(format!(
                    "{name}: duplicate rule for service_type '{}' / category {:?}",
                    rule.service_type, rule.category
                ));
            }
        }

        let window = self.reopening.window_days;
        if window == 0 || window > MAX_REOPENING_WINDOW_DAYS {
            errors.push(format!(
                "reopening.window_days = {window} is outside 1..={MAX_REOPENING_WINDOW_DAYS}"
            ));
        }

        if normalize::fold_all(&self.reopening.original_types).is_empty() {
            errors.push("reopening.original_types must list at least one service type".to_string());
        }

        if normalize::fold_all(&self.eligibility.valid_statuses).is_empty() {
            errors.push("eligibility.valid_statuses must list at least one status".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_goal_hours(hours: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, catch them explicitly
        if !hours.is_finite() {
            errors.push(format!("{name}: goal must be finite (got {hours})"));
            return;
        }
        if hours <= 0.0 || hours > MAX_GOAL_HOURS {
            errors.push(format!(
                "{name}: goal {hours:.2} h is outside (0, {MAX_GOAL_HOURS:.0}] hours"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Eligibility
// ============================================================================

/// Business rules deciding which orders enter the metrics.
///
/// All lists are compared after text folding, so casing and accents in the
/// TOML do not matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    /// Status labels that count as a completed visit
    #[serde(default = "default_valid_statuses")]
    pub valid_statuses: Vec<String>,

    /// Subtypes in scope. Empty means every subtype is accepted.
    #[serde(default)]
    pub valid_subtypes: Vec<String>,

    /// Reasons that take an order out of the metrics (customer absent, ...)
    #[serde(default = "default_excluded_reasons")]
    pub excluded_reasons: Vec<String>,
}

fn default_valid_statuses() -> Vec<String> {
    vec![
        "Finalizada".to_string(),
        "Concluída".to_string(),
        "Executada".to_string(),
    ]
}
fn default_excluded_reasons() -> Vec<String> {
    vec![
        "Cliente ausente".to_string(),
        "Cancelada a pedido do cliente".to_string(),
        "OS duplicada".to_string(),
    ]
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            valid_statuses: default_valid_statuses(),
            valid_subtypes: Vec::new(),
            excluded_reasons: default_excluded_reasons(),
        }
    }
}

// ============================================================================
// SLA Goals
// ============================================================================

/// Category → goal table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaConfig {
    /// Goal for combinations not covered by `goals` (hours)
    #[serde(default = "default_goal_hours")]
    pub default_goal_hours: f64,

    #[serde(default = "default_goal_rules")]
    pub goals: Vec<GoalRule>,
}

/// One row of the goal table.
///
/// A rule with a `category` only matches orders of that product line; a
/// rule without one matches the whole service type. Category-specific rules
/// take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRule {
    /// Display label, also the `by_category` key
    pub label: String,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ServiceCategory>,
    pub goal_hours: f64,
}

impl GoalRule {
    fn new(label: &str, service_type: &str, category: Option<ServiceCategory>, goal_hours: f64) -> Self {
        Self {
            label: label.to_string(),
            service_type: service_type.to_string(),
            category,
            goal_hours,
        }
    }
}

fn default_goal_hours() -> f64 {
    DEFAULT_GOAL_HOURS
}
fn default_goal_rules() -> Vec<GoalRule> {
    use ServiceCategory::{Fibra, Tv};
    vec![
        GoalRule::new("Corretiva TV", "Corretiva", Some(Tv), 24.0),
        GoalRule::new("Corretiva Fibra", "Corretiva", Some(Fibra), 24.0),
        GoalRule::new("Ponto Principal TV", "Ponto Principal", Some(Tv), 48.0),
        GoalRule::new("Ponto Principal Fibra", "Ponto Principal", Some(Fibra), 48.0),
        GoalRule::new("Ponto Adicional", "Ponto Adicional", None, 72.0),
        GoalRule::new("Mudança de Endereço", "Mudança de Endereço", None, 96.0),
    ]
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            default_goal_hours: default_goal_hours(),
            goals: default_goal_rules(),
        }
    }
}

// ============================================================================
// Reopening
// ============================================================================

/// How orders are grouped into "same installation point" partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageStrategy {
    /// Client + full street address when present, else client + city +
    /// neighborhood
    #[default]
    Address,
    /// Client + city + neighborhood, ignoring street addresses
    Neighborhood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReopeningConfig {
    /// Days after an original's finalization in which a new order counts
    /// as a reopening (inclusive)
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Service types that can open a reopening pair. Matched against the
    /// folded service type, or as a substring of the folded subtype.
    #[serde(default = "default_original_types")]
    pub original_types: Vec<String>,

    #[serde(default)]
    pub linkage: LinkageStrategy,
}

fn default_window_days() -> u32 {
    DEFAULT_REOPENING_WINDOW_DAYS
}
fn default_original_types() -> Vec<String> {
    vec!["Corretiva".to_string(), "Ponto Principal".to_string()]
}

impl Default for ReopeningConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            original_types: default_original_types(),
            linkage: LinkageStrategy::default(),
        }
    }
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default = "default_tv_keywords")]
    pub tv_keywords: Vec<String>,

    #[serde(default = "default_fibra_keywords")]
    pub fibra_keywords: Vec<String>,
}

fn default_tv_keywords() -> Vec<String> {
    vec!["tv".to_string(), "televisao".to_string()]
}
fn default_fibra_keywords() -> Vec<String> {
    vec!["fibra".to_string(), "ftth".to_string(), "internet".to_string()]
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            tv_keywords: default_tv_keywords(),
            fibra_keywords: default_fibra_keywords(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = KpiConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: KpiConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, KpiConfig::default());
        assert_eq!(config.sla.default_goal_hours, 48.0);
        assert_eq!(config.reopening.window_days, 30);
        assert_eq!(config.reopening.linkage, LinkageStrategy::Address);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[reopening]
window_days = 15
linkage = "neighborhood"

[[sla.goals]]
label = "Corretiva"
service_type = "Corretiva"
goal_hours = 12.0
"#;
        let config = KpiConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.reopening.window_days, 15);
        assert_eq!(config.reopening.linkage, LinkageStrategy::Neighborhood);
        // Replacing the goal array drops the built-in rules
        assert_eq!(config.sla.goals.len(), 1);
        assert!(config.sla.goals[0].category.is_none());
        // Non-overridden values retain defaults
        assert_eq!(config.sla.default_goal_hours, 48.0);
        assert_eq!(config.reopening.original_types, default_original_types());
    }

    #[test]
    fn test_goal_rule_category_parses() {
        let toml_str = r#"
[[sla.goals]]
label = "Corretiva TV"
service_type = "Corretiva"
category = "tv"
goal_hours = 24.0
"#;
        let config = KpiConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.sla.goals[0].category, Some(ServiceCategory::Tv));
    }

    #[test]
    fn test_validation_catches_zero_window() {
        let mut config = KpiConfig::default();
        config.reopening.window_days = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window_days"));
    }

    #[test]
    fn test_validation_catches_nan_goal() {
        let mut config = KpiConfig::default();
        config.sla.default_goal_hours = f64::NAN;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("finite")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_catches_duplicate_rules() {
        let mut config = KpiConfig::default();
        config
            .sla
            .goals
            .push(GoalRule::new("Outra Corretiva TV", "CORRETIVA", Some(ServiceCategory::Tv), 10.0));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validation_requires_original_types() {
        let mut config = KpiConfig::default();
        config.reopening.original_types = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = KpiConfig::default();
        let text = config.to_toml().unwrap();
        let back = KpiConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
