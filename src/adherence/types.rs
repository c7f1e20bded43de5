use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{AlertSeverity, AlertType, TimePeriod};

// ---------------------------------------------------------------------------
// AdherenceDetails
// ---------------------------------------------------------------------------

/// Composite snapshot over the monthly window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceDetails {
    pub adherence_percentage: u32,
    /// Skipped doses as a rounded percentage of all doses (0 with no doses).
    pub skip_rate: u32,
    pub missed_count: u32,
    pub weekly_adherence: u32,
    /// Mean lateness of late doses only, in whole minutes.
    pub average_delay_minutes: i64,
    pub most_missed_time_period: TimePeriod,
    pub total_doses: u32,
    pub taken_doses: u32,
    pub skipped_doses: u32,
    pub missed_doses: u32,
    pub window_days: u32,
}

// ---------------------------------------------------------------------------
// Adaptive reminders
// ---------------------------------------------------------------------------

/// Reminder timing for one daily clock time of one medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveReminder {
    pub medicine_id: Uuid,
    /// Configured time, `HH:MM`.
    pub scheduled_time: String,
    /// Time the reminder should fire, `HH:MM`.
    pub adaptive_time: String,
    pub mean_delay: i64,
    pub is_adaptive: bool,
    pub days_analyzed: u32,
}

/// Per-patient roll-up of reminder adaptation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveSummary {
    pub patient_id: Uuid,
    pub total_medicines: usize,
    pub adaptive_medicines: usize,
    pub pending_medicines: usize,
    /// Rounded mean of the adaptive medicines' mean delays.
    pub average_mean_delay: i64,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable across evaluations of the same condition.
    pub id: Uuid,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub patient_id: Uuid,
    pub patient_name: Option<String>,
    pub medicine_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

/// Who is looking. Only the doctor view raises mid-range adherence warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertView {
    Patient,
    Caregiver,
    Doctor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub missed: usize,
    pub low_stock: usize,
    pub low_adherence: bool,
    pub weekly_adherence: u32,
}

impl AlertCounts {
    pub fn total(&self) -> usize {
        self.missed + self.low_stock + usize::from(self.low_adherence)
    }
}

/// Alerts for one patient, critical first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    pub patient_id: Uuid,
    pub alerts: Vec<Alert>,
    pub counts: AlertCounts,
}

/// Alerts across every patient linked to a caregiver or doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelAlertReport {
    pub member_id: Uuid,
    pub view: AlertView,
    pub alerts: Vec<Alert>,
    pub patients: usize,
    pub patients_with_missed: usize,
    pub patients_with_low_stock: usize,
    pub patients_with_low_adherence: usize,
}

// ---------------------------------------------------------------------------
// AdherenceError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum AdherenceError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Medicine not found: {0}")]
    MedicineNotFound(Uuid),

    #[error("Invalid clock time: {0}")]
    InvalidClockTime(String),

    #[error("Window must span at least one day, got {0}")]
    InvalidWindow(u32),
}
