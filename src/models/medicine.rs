use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    /// Daily clock times, `HH:MM`.
    pub times: Vec<String>,
    /// Doses remaining. Never negative.
    pub stock: i64,
    pub instructions: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Medicine {
    /// Configured clock times that parse as `HH:MM`, in configured order.
    pub fn clock_times(&self) -> Vec<NaiveTime> {
        self.times
            .iter()
            .filter_map(|t| parse_clock_time(t))
            .collect()
    }
}

/// Parse `HH:MM` (seconds tolerated).
pub fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Render a clock time back to `HH:MM`.
pub fn format_clock_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_clock_time("08:00"), NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(parse_clock_time(" 20:15:00 "), NaiveTime::from_hms_opt(20, 15, 0));
        assert_eq!(parse_clock_time("25:00"), None);
        assert_eq!(parse_clock_time("noon"), None);
    }

    #[test]
    fn clock_times_skip_unparsable_entries() {
        let med = Medicine {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            name: "Aspirin".into(),
            dosage: "100mg".into(),
            frequency: "Twice daily".into(),
            times: vec!["08:00".into(), "bogus".into(), "20:00".into()],
            stock: 30,
            instructions: None,
            created_at: NaiveDateTime::default(),
        };
        let times = med.clock_times();
        assert_eq!(times.len(), 2);
        assert_eq!(format_clock_time(times[1]), "20:00");
    }
}
