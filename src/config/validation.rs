//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks on business rules.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use crate::normalize;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `KpiConfig`.
///
/// Array-of-table entries (`[[sla.goals]]`) are reported under the array's
/// path, so `sla.goals.label` covers the `label` of every goal rule.
/// Any new field added to `KpiConfig` must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [eligibility]
        "eligibility",
        "eligibility.valid_statuses",
        "eligibility.valid_subtypes",
        "eligibility.excluded_reasons",
        // [sla]
        "sla",
        "sla.default_goal_hours",
        "sla.goals",
        "sla.goals.label",
        "sla.goals.service_type",
        "sla.goals.category",
        "sla.goals.goal_hours",
        // [reopening]
        "reopening",
        "reopening.window_days",
        "reopening.original_types",
        "reopening.linkage",
        // [categories]
        "categories",
        "categories.tv_keywords",
        "categories.fibra_keywords",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = [{ d = 2 }] } }` yields:
/// `["a", "a.b", "a.c", "a.c.d"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for nested in walk_toml_keys(item, &path) {
                            if !keys.contains(&nested) {
                                keys.push(nested);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        // Tie-break on the key itself so suggestions do not depend on hash order
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns. Existing configs
/// always continue to work.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Flag values that are legal but probably a mistake.
///
/// Hard errors live in `KpiConfig::validate()`; everything here is advisory.
pub fn validate_plausibility(config: &super::KpiConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if config.reopening.window_days > 90 {
        warnings.push(ValidationWarning {
            field: "reopening.window_days".to_string(),
            message: format!(
                "reopening.window_days = {} is unusually long; unrelated visits will pair",
                config.reopening.window_days
            ),
            suggestion: None,
        });
    }

    for rule in &config.sla.goals {
        if rule.goal_hours.is_finite() && rule.goal_hours > 0.0 && rule.goal_hours < 1.0 {
            warnings.push(ValidationWarning {
                field: "sla.goals.goal_hours".to_string(),
                message: format!(
                    "goal for '{}' is {:.2} h; did you enter days instead of hours?",
                    rule.label, rule.goal_hours
                ),
                suggestion: None,
            });
        }
    }

    let tv: HashSet<String> = normalize::fold_all(&config.categories.tv_keywords).into_iter().collect();
    for kw in normalize::fold_all(&config.categories.fibra_keywords) {
        if tv.contains(&kw) {
            warnings.push(ValidationWarning {
                field: "categories.fibra_keywords".to_string(),
                message: format!("keyword '{kw}' is listed for both TV and Fibra; TV wins"),
                suggestion: None,
            });
        }
    }

    let statuses: HashSet<String> =
        normalize::fold_all(&config.eligibility.valid_statuses).into_iter().collect();
    for reason in normalize::fold_all(&config.eligibility.excluded_reasons) {
        if statuses.contains(&reason) {
            warnings.push(ValidationWarning {
                field: "eligibility.excluded_reasons".to_string(),
                message: format!("excluded reason '{reason}' is also a valid status label"),
                suggestion: None,
            });
        }
    }

    warnings
}
