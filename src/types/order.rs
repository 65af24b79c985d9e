//! Work-order input record

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One field-service work order as produced by the import pipeline.
///
/// Timestamps are wall-clock values from the dispatch system; no time zone
/// conversion is applied anywhere in the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    /// Order code, unique within a dataset
    pub code: String,
    #[serde(default)]
    pub client_code: String,
    #[serde(default)]
    pub client_name: String,

    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub service_subtype: String,
    /// Cancellation / diagnostic reason recorded at closure
    #[serde(default)]
    pub reason: String,
    /// Free-text status label from the dispatch system
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub finalized_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub neighborhood: String,
    // Full address, only used for linkage when present
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,

    #[serde(default)]
    pub technician_id: String,
    #[serde(default)]
    pub technician_name: String,
}

impl ServiceOrder {
    /// Elapsed hours between creation and finalization, with full
    /// sub-hour precision. `None` when either timestamp is missing.
    pub fn service_time_hours(&self) -> Option<f64> {
        let created = self.created_at?;
        let finalized = self.finalized_at?;
        Some(hours_between(created, finalized))
    }

    /// Label used for technician breakdowns: name, falling back to the id.
    pub fn technician_label(&self) -> &str {
        let name = self.technician_name.trim();
        if name.is_empty() {
            self.technician_id.trim()
        } else {
            name
        }
    }

    /// Whether the order carries a usable street address.
    pub fn has_street_address(&self) -> bool {
        self.street.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// Signed elapsed hours from `from` to `to`, millisecond precision.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}
