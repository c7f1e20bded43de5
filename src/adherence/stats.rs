//! Adherence statistics over a set of dose logs.

use chrono::Timelike;

use crate::models::enums::{DoseStatus, TimePeriod};
use crate::models::{DoseLog, WindowCounts};

use super::types::AdherenceDetails;
use super::window::{percentage, rate};

/// Totals by status for a slice of logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub total: u32,
    pub taken: u32,
    pub skipped: u32,
    pub missed: u32,
}

impl StatusTally {
    pub fn of(logs: &[DoseLog]) -> Self {
        let mut tally = Self::default();
        for log in logs {
            tally.total += 1;
            match log.status {
                DoseStatus::Taken => tally.taken += 1,
                DoseStatus::Skipped => tally.skipped += 1,
                DoseStatus::Missed => tally.missed += 1,
                DoseStatus::Pending => {}
            }
        }
        tally
    }

    pub fn window_counts(&self) -> WindowCounts {
        WindowCounts {
            total: self.total,
            taken: self.taken,
        }
    }
}

/// Mean lateness in whole minutes across taken doses that were late.
///
/// Early and on-time doses are left out entirely, so they neither offset
/// late ones nor dilute the mean. 0 when no dose was late.
pub fn average_delay_minutes(logs: &[DoseLog]) -> i64 {
    let late: Vec<f64> = logs
        .iter()
        .filter_map(DoseLog::delay_minutes)
        .filter(|delay| *delay > 0.0)
        .collect();

    if late.is_empty() {
        return 0;
    }
    (late.iter().sum::<f64>() / late.len() as f64).round() as i64
}

/// Time-of-day bucket holding the most missed or skipped doses.
///
/// Only a strictly larger count replaces the current leader, so ties go to
/// the earlier bucket in Morning, Afternoon, Evening, Night order.
pub fn most_missed_period(logs: &[DoseLog]) -> TimePeriod {
    let mut counts = [0u32; 4];
    for log in logs {
        if matches!(log.status, DoseStatus::Missed | DoseStatus::Skipped) {
            let period = TimePeriod::from_hour(log.scheduled_time.hour());
            if let Some(idx) = TimePeriod::BUCKETS.iter().position(|p| *p == period) {
                counts[idx] += 1;
            }
        }
    }

    let mut leader = TimePeriod::NoMisses;
    let mut max = 0;
    for (period, count) in TimePeriod::BUCKETS.iter().zip(counts) {
        if count > max {
            max = count;
            leader = *period;
        }
    }
    leader
}

/// Build the composite report from the monthly window's logs.
pub fn build_details(logs: &[DoseLog], weekly_adherence: u32, window_days: u32) -> AdherenceDetails {
    let tally = StatusTally::of(logs);
    AdherenceDetails {
        adherence_percentage: rate(tally.window_counts()),
        skip_rate: percentage(tally.skipped, tally.total).unwrap_or(0),
        missed_count: tally.missed,
        weekly_adherence,
        average_delay_minutes: average_delay_minutes(logs),
        most_missed_time_period: most_missed_period(logs),
        total_doses: tally.total,
        taken_doses: tally.taken,
        skipped_doses: tally.skipped,
        missed_doses: tally.missed,
        window_days,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use uuid::Uuid;

    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn log(status: DoseStatus, scheduled: &str, taken: Option<&str>) -> DoseLog {
        DoseLog {
            id: Uuid::new_v4(),
            medicine_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            scheduled_time: ts(scheduled),
            taken_at: taken.map(ts),
            status,
            notes: None,
            created_at: ts(scheduled),
        }
    }

    #[test]
    fn early_doses_do_not_cancel_late_ones() {
        let logs = vec![
            log(DoseStatus::Taken, "2026-03-01 08:00", Some("2026-03-01 08:20")),
            log(DoseStatus::Taken, "2026-03-02 08:00", Some("2026-03-02 07:00")),
            log(DoseStatus::Taken, "2026-03-03 08:00", Some("2026-03-03 08:10")),
        ];
        assert_eq!(average_delay_minutes(&logs), 15);
    }

    #[test]
    fn no_late_doses_means_zero_delay() {
        let logs = vec![
            log(DoseStatus::Taken, "2026-03-01 08:00", Some("2026-03-01 07:55")),
            log(DoseStatus::Missed, "2026-03-02 08:00", None),
            log(DoseStatus::Taken, "2026-03-03 08:00", None),
        ];
        assert_eq!(average_delay_minutes(&logs), 0);
        assert_eq!(average_delay_minutes(&[]), 0);
    }

    #[test]
    fn most_missed_picks_strict_maximum() {
        let logs = vec![
            log(DoseStatus::Missed, "2026-03-01 08:00", None),
            log(DoseStatus::Skipped, "2026-03-01 19:00", None),
            log(DoseStatus::Missed, "2026-03-02 21:00", None),
            log(DoseStatus::Taken, "2026-03-02 09:00", Some("2026-03-02 09:00")),
            log(DoseStatus::Taken, "2026-03-03 09:00", Some("2026-03-03 09:00")),
        ];
        assert_eq!(most_missed_period(&logs), TimePeriod::Evening);
    }

    #[test]
    fn most_missed_tie_keeps_earlier_bucket() {
        let logs = vec![
            log(DoseStatus::Missed, "2026-03-01 02:00", None),
            log(DoseStatus::Missed, "2026-03-01 13:00", None),
            log(DoseStatus::Skipped, "2026-03-02 03:00", None),
            log(DoseStatus::Skipped, "2026-03-02 14:00", None),
        ];
        assert_eq!(most_missed_period(&logs), TimePeriod::Afternoon);
    }

    #[test]
    fn no_misses_reports_sentinel() {
        let logs = vec![log(DoseStatus::Taken, "2026-03-01 08:00", Some("2026-03-01 08:00"))];
        assert_eq!(most_missed_period(&logs), TimePeriod::NoMisses);
        assert_eq!(TimePeriod::NoMisses.as_str(), "None");
    }

    #[test]
    fn details_combine_counts_and_rates() {
        let logs = vec![
            log(DoseStatus::Taken, "2026-03-01 08:00", Some("2026-03-01 08:30")),
            log(DoseStatus::Taken, "2026-03-01 20:00", Some("2026-03-01 20:10")),
            log(DoseStatus::Skipped, "2026-03-02 08:00", None),
            log(DoseStatus::Missed, "2026-03-02 20:00", None),
            log(DoseStatus::Pending, "2026-03-03 08:00", None),
        ];
        let details = build_details(&logs, 50, 30);
        assert_eq!(details.total_doses, 5);
        assert_eq!(details.taken_doses, 2);
        assert_eq!(details.adherence_percentage, 40);
        assert_eq!(details.skip_rate, 20);
        assert_eq!(details.missed_count, 1);
        assert_eq!(details.average_delay_minutes, 20);
        assert_eq!(details.most_missed_time_period, TimePeriod::Morning);
        assert_eq!(details.weekly_adherence, 50);
    }

    #[test]
    fn details_of_nothing_use_zero_data_defaults() {
        let details = build_details(&[], 100, 30);
        assert_eq!(details.adherence_percentage, 100);
        assert_eq!(details.skip_rate, 0);
        assert_eq!(details.average_delay_minutes, 0);
        assert_eq!(details.most_missed_time_period, TimePeriod::NoMisses);
    }
}
