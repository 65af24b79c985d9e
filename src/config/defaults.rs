//! System-wide default constants.
//!
//! Built-in values used when no `kpi_config.toml` overrides them.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "FIELDOPS_KPI_CONFIG";

/// Config file looked up in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "kpi_config.toml";

// ============================================================================
// SLA Goals
// ============================================================================

/// Goal applied to service type / subtype combinations absent from the
/// goal table (hours).
pub const DEFAULT_GOAL_HOURS: f64 = 48.0;

/// Upper bound accepted for any goal (hours). 2 160 = 90 days.
pub const MAX_GOAL_HOURS: f64 = 2_160.0;

// ============================================================================
// Reopening Detection
// ============================================================================

/// Window after an original's finalization during which a new order at the
/// same installation counts as a reopening (days).
pub const DEFAULT_REOPENING_WINDOW_DAYS: u32 = 30;

/// Largest window accepted by validation (days).
pub const MAX_REOPENING_WINDOW_DAYS: u32 = 365;

/// Bucket used for pairs whose reopening order has no reason recorded.
pub const UNSPECIFIED_REASON_LABEL: &str = "Sem motivo";

/// Bucket used for blank technician / city / neighborhood values.
pub const UNKNOWN_DIMENSION_LABEL: &str = "Não informado";
