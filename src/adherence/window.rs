//! Time-window aggregation primitives.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::WindowCounts;

/// Rate reported for a window with no scheduled doses.
pub const EMPTY_WINDOW_RATE: u32 = 100;

/// A calendar-date window ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceWindow {
    /// Today's calendar date only.
    Today,
    /// The last `weekly_window_days` dates, today included.
    Week,
    /// The last `monthly_window_days` dates, today included.
    Month,
    /// The last `n` dates, today included.
    Days(u32),
}

impl AdherenceWindow {
    /// Inclusive `(from, to)` dates spanning exactly the window's day count,
    /// today included.
    pub fn bounds(&self, today: NaiveDate, config: &EngineConfig) -> (NaiveDate, NaiveDate) {
        let days = match self {
            Self::Today => 1,
            Self::Week => config.weekly_window_days,
            Self::Month => config.monthly_window_days,
            Self::Days(n) => *n,
        };
        (trailing_start(today, days), today)
    }
}

/// First date of a `days`-long window ending today. Zero days means today only.
pub fn trailing_start(today: NaiveDate, days: u32) -> NaiveDate {
    today - Duration::days(i64::from(days.saturating_sub(1)))
}

/// `round(taken / total * 100)`, half-up; 100 when nothing was scheduled.
pub fn rate(counts: WindowCounts) -> u32 {
    percentage(counts.taken, counts.total).unwrap_or(EMPTY_WINDOW_RATE)
}

/// Rounded share of `part` in `whole`, `None` when `whole` is zero.
pub fn percentage(part: u32, whole: u32) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    let exact = f64::from(part) * 100.0 / f64::from(whole);
    // Inputs are non-negative, so round() is half-up here.
    Some(exact.round().clamp(0.0, 100.0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_window_is_full_adherence() {
        assert_eq!(rate(WindowCounts { total: 0, taken: 0 }), 100);
    }

    #[test]
    fn rate_rounds_half_up() {
        assert_eq!(rate(WindowCounts { total: 8, taken: 1 }), 13); // 12.5
        assert_eq!(rate(WindowCounts { total: 3, taken: 1 }), 33);
        assert_eq!(rate(WindowCounts { total: 3, taken: 2 }), 67);
        assert_eq!(rate(WindowCounts { total: 200, taken: 1 }), 1); // 0.5
    }

    #[test]
    fn rate_stays_in_bounds() {
        for total in 1..=20u32 {
            for taken in 0..=total {
                let r = rate(WindowCounts { total, taken });
                assert!(r <= 100);
                assert_eq!(r, (f64::from(taken) * 100.0 / f64::from(total)).round() as u32);
            }
        }
    }

    #[test]
    fn window_bounds() {
        let config = EngineConfig::default();
        let today = d(2026, 3, 10);
        assert_eq!(AdherenceWindow::Today.bounds(today, &config), (today, today));
        assert_eq!(AdherenceWindow::Week.bounds(today, &config), (d(2026, 3, 4), today));
        assert_eq!(AdherenceWindow::Month.bounds(today, &config), (d(2026, 2, 9), today));
        assert_eq!(AdherenceWindow::Days(5).bounds(today, &config), (d(2026, 3, 6), today));
    }

    #[test]
    fn windows_hold_exactly_their_day_count() {
        let today = d(2026, 3, 10);
        for days in [1u32, 5, 7, 30] {
            let span = (today - trailing_start(today, days)).num_days() + 1;
            assert_eq!(span, i64::from(days));
        }
        assert_eq!(trailing_start(today, 0), today);
    }

    #[test]
    fn percentage_of_nothing_is_none() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(1, 4), Some(25));
    }
}
