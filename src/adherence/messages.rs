/// Alert titles and messages shown to patients, caregivers and doctors.
pub struct MessageTemplates;

impl MessageTemplates {
    pub fn missed_title(medicine: &str) -> String {
        format!("Repeatedly missed: {medicine}")
    }

    pub fn missed(medicine: &str, missed: u32, window_days: u32) -> String {
        format!("{medicine} was missed {missed} times in the last {window_days} days.")
    }

    pub fn low_stock_title(medicine: &str, critical: bool) -> String {
        if critical {
            format!("{medicine} is almost out")
        } else {
            format!("{medicine} is running low")
        }
    }

    pub fn low_stock(medicine: &str, stock: i64) -> String {
        match stock {
            0 => format!("No doses of {medicine} left. Refill as soon as possible."),
            1 => format!("Only 1 dose of {medicine} left. Time to refill."),
            n => format!("Only {n} doses of {medicine} left. Time to refill."),
        }
    }

    pub fn low_adherence_title(critical: bool) -> String {
        if critical {
            "Low weekly adherence".to_string()
        } else {
            "Weekly adherence below target".to_string()
        }
    }

    pub fn low_adherence(rate: u32, threshold: f64) -> String {
        format!("Weekly adherence is {rate}%, below the {threshold:.0}% threshold.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_message_pluralizes() {
        assert!(MessageTemplates::low_stock("Aspirin", 1).contains("1 dose of"));
        assert!(MessageTemplates::low_stock("Aspirin", 4).contains("4 doses of"));
        assert!(MessageTemplates::low_stock("Aspirin", 0).starts_with("No doses"));
    }

    #[test]
    fn adherence_message_shows_threshold_without_decimals() {
        let msg = MessageTemplates::low_adherence(45, 60.0);
        assert_eq!(msg, "Weekly adherence is 45%, below the 60% threshold.");
    }
}
