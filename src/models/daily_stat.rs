use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per (patient, calendar date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAdherenceStat {
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub total_doses: u32,
    pub taken_doses: u32,
    /// 0–100.
    pub adherence_rate: f64,
}
