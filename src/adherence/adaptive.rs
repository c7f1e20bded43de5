//! Reminder-time personalization from observed lateness.

use chrono::{Duration, NaiveTime};
use uuid::Uuid;

use crate::models::{format_clock_time, DoseLog};

use super::types::{AdaptiveReminder, AdaptiveSummary};

/// Rounded mean lateness over the analysed doses.
///
/// Only positive delays are summed, but the divisor is every analysed
/// dose, so punctual days pull the mean toward zero. Never negative.
pub fn mean_delay(delays: &[f64]) -> i64 {
    if delays.is_empty() {
        return 0;
    }
    let late_sum: f64 = delays.iter().filter(|d| **d > 0.0).sum();
    (late_sum / delays.len() as f64).round() as i64
}

/// Shift `scheduled` by `minutes`, wrapping past midnight.
pub fn shift_clock_time(scheduled: NaiveTime, minutes: i64) -> NaiveTime {
    scheduled.overflowing_add_signed(Duration::minutes(minutes)).0
}

/// Reminder timing for one slot from its taken doses in the analysis window.
///
/// Doses without a readable intake time are not analysed. Below
/// `min_days` analysed doses the reminder stays at the scheduled time.
pub fn adaptive_reminder(
    medicine_id: Uuid,
    scheduled: NaiveTime,
    taken_logs: &[DoseLog],
    min_days: u32,
) -> AdaptiveReminder {
    let delays: Vec<f64> = taken_logs.iter().filter_map(DoseLog::delay_minutes).collect();
    let days_analyzed = delays.len() as u32;
    let is_adaptive = days_analyzed >= min_days;

    let delay = if is_adaptive { mean_delay(&delays) } else { 0 };
    let adaptive = shift_clock_time(scheduled, delay);

    AdaptiveReminder {
        medicine_id,
        scheduled_time: format_clock_time(scheduled),
        adaptive_time: format_clock_time(adaptive),
        mean_delay: delay,
        is_adaptive,
        days_analyzed,
    }
}

/// Roll per-slot results up to one summary per patient.
///
/// A medicine counts as adaptive once any of its slots is; its delay is
/// the mean over those adaptive slots.
pub fn summarize(patient_id: Uuid, schedules: &[Vec<AdaptiveReminder>]) -> AdaptiveSummary {
    let mut medicine_delays = Vec::new();
    for slots in schedules {
        let adaptive: Vec<i64> = slots
            .iter()
            .filter(|s| s.is_adaptive)
            .map(|s| s.mean_delay)
            .collect();
        if !adaptive.is_empty() {
            medicine_delays.push(adaptive.iter().sum::<i64>() as f64 / adaptive.len() as f64);
        }
    }

    let average_mean_delay = if medicine_delays.is_empty() {
        0
    } else {
        (medicine_delays.iter().sum::<f64>() / medicine_delays.len() as f64).round() as i64
    };

    AdaptiveSummary {
        patient_id,
        total_medicines: schedules.len(),
        adaptive_medicines: medicine_delays.len(),
        pending_medicines: schedules.len() - medicine_delays.len(),
        average_mean_delay,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::models::enums::DoseStatus;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn taken(day: u32, scheduled: &str, taken: &str) -> DoseLog {
        let ts = |t: &str| {
            NaiveDateTime::parse_from_str(&format!("2026-03-{day:02} {t}"), "%Y-%m-%d %H:%M").unwrap()
        };
        DoseLog {
            id: Uuid::new_v4(),
            medicine_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            scheduled_time: ts(scheduled),
            taken_at: Some(ts(taken)),
            status: DoseStatus::Taken,
            notes: None,
            created_at: ts(scheduled),
        }
    }

    #[test]
    fn habitual_lateness_shifts_reminder() {
        let logs = vec![
            taken(1, "12:30", "12:33"),
            taken(2, "12:30", "12:35"),
            taken(3, "12:30", "12:32"),
            taken(4, "12:30", "12:34"),
            taken(5, "12:30", "12:31"),
        ];
        let r = adaptive_reminder(Uuid::nil(), hm(12, 30), &logs, 3);
        assert!(r.is_adaptive);
        assert_eq!(r.days_analyzed, 5);
        assert_eq!(r.mean_delay, 3);
        assert_eq!(r.scheduled_time, "12:30");
        assert_eq!(r.adaptive_time, "12:33");
    }

    #[test]
    fn early_doses_dilute_but_never_go_negative() {
        let logs = vec![
            taken(1, "08:00", "08:30"),
            taken(2, "08:00", "07:00"),
            taken(3, "08:00", "07:30"),
        ];
        let r = adaptive_reminder(Uuid::nil(), hm(8, 0), &logs, 3);
        assert_eq!(r.mean_delay, 10);
        assert_eq!(r.adaptive_time, "08:10");

        let all_early = vec![
            taken(1, "08:00", "07:50"),
            taken(2, "08:00", "07:40"),
            taken(3, "08:00", "07:59"),
        ];
        let r = adaptive_reminder(Uuid::nil(), hm(8, 0), &all_early, 3);
        assert!(r.is_adaptive);
        assert_eq!(r.mean_delay, 0);
        assert_eq!(r.adaptive_time, r.scheduled_time);
    }

    #[test]
    fn too_little_history_is_not_adaptive() {
        let logs = vec![taken(1, "08:00", "09:00"), taken(2, "08:00", "09:00")];
        let r = adaptive_reminder(Uuid::nil(), hm(8, 0), &logs, 3);
        assert!(!r.is_adaptive);
        assert_eq!(r.days_analyzed, 2);
        assert_eq!(r.mean_delay, 0);
        assert_eq!(r.adaptive_time, "08:00");

        let none = adaptive_reminder(Uuid::nil(), hm(8, 0), &[], 3);
        assert!(!none.is_adaptive);
        assert_eq!(none.adaptive_time, none.scheduled_time);
    }

    #[test]
    fn doses_without_intake_time_are_not_analysed() {
        let mut logs = vec![
            taken(1, "08:00", "08:30"),
            taken(2, "08:00", "08:30"),
            taken(3, "08:00", "08:30"),
        ];
        logs[2].taken_at = None;
        let r = adaptive_reminder(Uuid::nil(), hm(8, 0), &logs, 3);
        assert_eq!(r.days_analyzed, 2);
        assert!(!r.is_adaptive);
    }

    #[test]
    fn late_evening_reminder_wraps_past_midnight() {
        assert_eq!(shift_clock_time(hm(23, 50), 20), hm(0, 10));
        assert_eq!(shift_clock_time(hm(9, 0), 0), hm(9, 0));
    }

    #[test]
    fn mean_delay_rounds_half_up() {
        assert_eq!(mean_delay(&[1.0, 2.0]), 2);
        assert_eq!(mean_delay(&[-5.0, -1.0]), 0);
        assert_eq!(mean_delay(&[]), 0);
    }

    #[test]
    fn summary_counts_adaptive_and_pending_medicines() {
        let slot = |delay: i64, adaptive: bool| AdaptiveReminder {
            medicine_id: Uuid::nil(),
            scheduled_time: "08:00".into(),
            adaptive_time: "08:00".into(),
            mean_delay: delay,
            is_adaptive: adaptive,
            days_analyzed: if adaptive { 5 } else { 1 },
        };
        let schedules = vec![
            vec![slot(10, true), slot(20, true)],
            vec![slot(5, true), slot(0, false)],
            vec![slot(0, false)],
        ];
        let summary = summarize(Uuid::nil(), &schedules);
        assert_eq!(summary.total_medicines, 3);
        assert_eq!(summary.adaptive_medicines, 2);
        assert_eq!(summary.pending_medicines, 1);
        assert_eq!(summary.average_mean_delay, 10);
    }

    #[test]
    fn summary_without_adaptive_medicines_is_zero() {
        let summary = summarize(Uuid::nil(), &[]);
        assert_eq!(summary.adaptive_medicines, 0);
        assert_eq!(summary.average_mean_delay, 0);
    }
}
