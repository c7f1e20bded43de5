use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DoseStatus;

/// One scheduled occurrence of one medicine for one patient.
///
/// `taken_at` is set exactly when `status` is `Taken`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseLog {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_time: NaiveDateTime,
    pub taken_at: Option<NaiveDateTime>,
    pub status: DoseStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl DoseLog {
    /// Minutes between schedule and intake. `None` unless taken with a timestamp.
    pub fn delay_minutes(&self) -> Option<f64> {
        if self.status != DoseStatus::Taken {
            return None;
        }
        let taken_at = self.taken_at?;
        Some((taken_at - self.scheduled_time).num_seconds() as f64 / 60.0)
    }
}

/// Dose counts over a calendar-date window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounts {
    pub total: u32,
    pub taken: u32,
}

/// Missed doses of a single medicine over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedCount {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub missed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(status: DoseStatus, scheduled: &str, taken: Option<&str>) -> DoseLog {
        let parse = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        DoseLog {
            id: Uuid::new_v4(),
            medicine_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            scheduled_time: parse(scheduled),
            taken_at: taken.map(parse),
            status,
            notes: None,
            created_at: parse(scheduled),
        }
    }

    #[test]
    fn delay_is_signed_minutes() {
        let late = log(DoseStatus::Taken, "2026-01-01 12:30", Some("2026-01-01 12:45"));
        assert_eq!(late.delay_minutes(), Some(15.0));
        let early = log(DoseStatus::Taken, "2026-01-01 12:30", Some("2026-01-01 12:20"));
        assert_eq!(early.delay_minutes(), Some(-10.0));
    }

    #[test]
    fn no_delay_without_intake() {
        assert_eq!(log(DoseStatus::Missed, "2026-01-01 08:00", None).delay_minutes(), None);
        assert_eq!(log(DoseStatus::Taken, "2026-01-01 08:00", None).delay_minutes(), None);
    }
}
