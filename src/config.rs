use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Dosewise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SQLite file name inside the data directory.
pub const DATABASE_FILE: &str = "dosewise.db";

/// Get the application data directory
/// ~/Dosewise/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join("Dosewise")
}

/// Default on-disk location of the record store.
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "dosewise=info,dosewise_lib=info"
}

// ═══════════════════════════════════════════════════════════
// Engine thresholds
// ═══════════════════════════════════════════════════════════

/// Every window length and cut-off the adherence engine applies.
///
/// Defaults match the clinical rules the app ships with. A JSON override
/// only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trailing days of taken doses analysed for reminder adaptation.
    pub adaptive_window_days: u32,
    /// Minimum qualifying taken doses before a reminder is shifted.
    pub adaptive_min_days: u32,
    /// "Weekly" adherence window.
    pub weekly_window_days: u32,
    /// "Monthly" adherence window, also used for details and miss alerts.
    pub monthly_window_days: u32,
    /// Missed doses of one medicine (monthly window) that raise a critical alert.
    pub missed_alert_threshold: u32,
    /// Stock at or below this raises a warning.
    pub stock_warning_level: i64,
    /// Stock at or below this escalates to critical.
    pub stock_critical_level: i64,
    /// Weekly adherence strictly below this is critical.
    pub adherence_critical_below: f64,
    /// Doctor view only: weekly adherence below this (and not critical) is a warning.
    pub adherence_warning_below: f64,
    /// Daily stat rows read for trend prediction.
    pub trend_window_days: u32,
    pub trend_min_points: usize,
    /// Mean difference (percentage points) separating a trend from stable.
    pub trend_delta: f64,
    /// Pending doses older than this are expired to missed.
    pub overdue_grace_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adaptive_window_days: 5,
            adaptive_min_days: 3,
            weekly_window_days: 7,
            monthly_window_days: 30,
            missed_alert_threshold: 3,
            stock_warning_level: 5,
            stock_critical_level: 2,
            adherence_critical_below: 60.0,
            adherence_warning_below: 80.0,
            trend_window_days: 7,
            trend_min_points: 3,
            trend_delta: 10.0,
            overdue_grace_minutes: 120,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON override. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let dir = app_data_dir();
        assert!(dir.ends_with("Dosewise"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with(DATABASE_FILE));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"stock_warning_level": 7}"#).unwrap();
        assert_eq!(config.stock_warning_level, 7);
        assert_eq!(config.stock_critical_level, 2);
        assert_eq!(config.adaptive_window_days, 5);
    }

    #[test]
    fn empty_override_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
