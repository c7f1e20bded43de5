//! Coarse adherence direction from recent daily rates.

use crate::models::enums::TrendDirection;

/// Compare the mean of the last `sample` rates with the mean of the first
/// `sample`. Rates are oldest first. Fewer than `sample` points, or a
/// difference within `delta`, is `Stable`.
pub fn classify_trend(rates: &[f64], sample: usize, delta: f64) -> TrendDirection {
    if sample == 0 || rates.len() < sample {
        return TrendDirection::Stable;
    }

    let first = mean(&rates[..sample]);
    let last = mean(&rates[rates.len() - sample..]);
    let diff = last - first;

    if diff > delta {
        TrendDirection::Improving
    } else if diff < -delta {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(rates: &[f64]) -> TrendDirection {
        classify_trend(rates, 3, 10.0)
    }

    #[test]
    fn rising_rates_improve() {
        assert_eq!(classify(&[50.0, 50.0, 50.0, 90.0, 90.0, 90.0]), TrendDirection::Improving);
    }

    #[test]
    fn small_dip_is_stable() {
        assert_eq!(classify(&[90.0, 90.0, 90.0, 85.0, 88.0, 86.0]), TrendDirection::Stable);
    }

    #[test]
    fn falling_rates_decline() {
        assert_eq!(classify(&[100.0, 95.0, 90.0, 60.0, 50.0, 40.0]), TrendDirection::Declining);
    }

    #[test]
    fn exactly_delta_is_stable() {
        assert_eq!(classify(&[50.0, 50.0, 50.0, 60.0, 60.0, 60.0]), TrendDirection::Stable);
    }

    #[test]
    fn fewer_than_three_points_is_stable() {
        assert_eq!(classify(&[]), TrendDirection::Stable);
        assert_eq!(classify(&[0.0]), TrendDirection::Stable);
        assert_eq!(classify(&[0.0, 100.0]), TrendDirection::Stable);
    }

    #[test]
    fn three_points_compare_against_themselves() {
        assert_eq!(classify(&[0.0, 50.0, 100.0]), TrendDirection::Stable);
    }
}
