//! Filter context supplied by the caller for each computation

use serde::{Deserialize, Serialize};

use crate::normalize;

/// Original-type filter values that mean "no narrowing".
const ALL_TYPES_SENTINELS: &[&str] = &["", "all", "todos", "todas"];

/// Selection the caller applied before asking for metrics.
///
/// Month and year stay as strings because that is what the period pickers
/// hand over; they are parsed by `metrics::period`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterContext {
    #[serde(default)]
    pub selected_month: Option<String>,
    #[serde(default)]
    pub selected_year: Option<String>,
    #[serde(default)]
    pub original_service_type_filter: String,
    #[serde(default = "default_show_data")]
    pub show_data: bool,
}

fn default_show_data() -> bool {
    true
}

impl Default for FilterContext {
    fn default() -> Self {
        Self {
            selected_month: None,
            selected_year: None,
            original_service_type_filter: String::new(),
            show_data: default_show_data(),
        }
    }
}

impl FilterContext {
    /// Context covering a single month of a year.
    pub fn for_month(year: i32, month: u32) -> Self {
        Self {
            selected_month: Some(month.to_string()),
            selected_year: Some(year.to_string()),
            ..Self::default()
        }
    }

    pub fn with_original_type(mut self, original_type: impl Into<String>) -> Self {
        self.original_service_type_filter = original_type.into();
        self
    }

    /// Folded original-type filter, or `None` when it selects every type.
    pub fn original_type_key(&self) -> Option<String> {
        let key = normalize::fold(&self.original_service_type_filter);
        if ALL_TYPES_SENTINELS.contains(&key.as_str()) {
            None
        } else {
            Some(key)
        }
    }
}
