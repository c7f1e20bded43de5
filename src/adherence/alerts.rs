//! Alert derivation and ranking.
//!
//! Sources are evaluated in a fixed order (repeated misses, stock,
//! adherence) and the result is stably sorted by severity, so equal
//! severities keep that emission order.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::enums::{AlertSeverity, AlertType};
use crate::models::{Medicine, MissedCount};

use super::messages::MessageTemplates;
use super::types::{Alert, AlertCounts, AlertReport, AlertView, PanelAlertReport};

/// Namespace for v5 alert ids.
const ALERT_NAMESPACE: Uuid = Uuid::from_u128(0x6d2f_4c1e_9a7b_4f0d_8e35_b1c2_a9d4_7e61);

/// Subject used for the patient-wide adherence alert id.
const WEEKLY_SUBJECT: &str = "weekly";

/// Everything alert evaluation needs for one patient.
pub struct AlertInputs<'a> {
    pub patient_id: Uuid,
    pub patient_name: Option<&'a str>,
    /// Missed counts over the monthly window.
    pub missed: &'a [MissedCount],
    pub medicines: &'a [Medicine],
    pub weekly_rate: u32,
}

/// Deterministic id for a condition on a subject.
pub fn alert_id(alert_type: AlertType, patient_id: &Uuid, subject: &str) -> Uuid {
    let name = format!("{}:{}:{}", alert_type.as_str(), patient_id, subject);
    Uuid::new_v5(&ALERT_NAMESPACE, name.as_bytes())
}

/// Stable sort, critical first.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by_key(|a| a.severity.rank());
}

pub fn stock_severity(stock: i64, config: &EngineConfig) -> Option<AlertSeverity> {
    if stock <= config.stock_critical_level {
        Some(AlertSeverity::Critical)
    } else if stock <= config.stock_warning_level {
        Some(AlertSeverity::Warning)
    } else {
        None
    }
}

/// Severity of the weekly-adherence alert. The warning band exists only
/// in the doctor view.
pub fn adherence_severity(
    weekly_rate: u32,
    view: AlertView,
    config: &EngineConfig,
) -> Option<AlertSeverity> {
    let rate = f64::from(weekly_rate);
    if rate < config.adherence_critical_below {
        Some(AlertSeverity::Critical)
    } else if view == AlertView::Doctor && rate < config.adherence_warning_below {
        Some(AlertSeverity::Warning)
    } else {
        None
    }
}

/// Derive and rank every alert for one patient.
pub fn evaluate_alerts(
    inputs: &AlertInputs<'_>,
    view: AlertView,
    config: &EngineConfig,
    now: NaiveDateTime,
) -> AlertReport {
    let patient_id = inputs.patient_id;
    let build = |alert_type: AlertType,
                 severity: AlertSeverity,
                 subject: &str,
                 medicine_id: Option<Uuid>,
                 title: String,
                 message: String| Alert {
        id: alert_id(alert_type, &patient_id, subject),
        alert_type,
        severity,
        title,
        message,
        patient_id,
        patient_name: inputs.patient_name.map(str::to_string),
        medicine_id,
        created_at: now,
    };

    let mut alerts = Vec::new();
    let mut counts = AlertCounts {
        weekly_adherence: inputs.weekly_rate,
        ..AlertCounts::default()
    };

    for missed in inputs.missed {
        if missed.missed >= config.missed_alert_threshold {
            counts.missed += 1;
            alerts.push(build(
                AlertType::MissedThreeTimes,
                AlertSeverity::Critical,
                &missed.medicine_id.to_string(),
                Some(missed.medicine_id),
                MessageTemplates::missed_title(&missed.medicine_name),
                MessageTemplates::missed(
                    &missed.medicine_name,
                    missed.missed,
                    config.monthly_window_days,
                ),
            ));
        }
    }

    for medicine in inputs.medicines {
        if let Some(severity) = stock_severity(medicine.stock, config) {
            counts.low_stock += 1;
            alerts.push(build(
                AlertType::LowStock,
                severity,
                &medicine.id.to_string(),
                Some(medicine.id),
                MessageTemplates::low_stock_title(&medicine.name, severity == AlertSeverity::Critical),
                MessageTemplates::low_stock(&medicine.name, medicine.stock),
            ));
        }
    }

    if let Some(severity) = adherence_severity(inputs.weekly_rate, view, config) {
        counts.low_adherence = true;
        let critical = severity == AlertSeverity::Critical;
        let threshold = if critical {
            config.adherence_critical_below
        } else {
            config.adherence_warning_below
        };
        alerts.push(build(
            AlertType::LowAdherence,
            severity,
            WEEKLY_SUBJECT,
            None,
            MessageTemplates::low_adherence_title(critical),
            MessageTemplates::low_adherence(inputs.weekly_rate, threshold),
        ));
    }

    sort_alerts(&mut alerts);

    AlertReport {
        patient_id,
        alerts,
        counts,
    }
}

/// Merge per-patient reports into one ranked list with distinct-patient counts.
pub fn merge_reports(member_id: Uuid, view: AlertView, reports: Vec<AlertReport>) -> PanelAlertReport {
    let patients = reports.len();
    let mut with_missed = HashSet::new();
    let mut with_low_stock = HashSet::new();
    let mut with_low_adherence = HashSet::new();
    let mut alerts = Vec::new();

    for report in reports {
        if report.counts.missed > 0 {
            with_missed.insert(report.patient_id);
        }
        if report.counts.low_stock > 0 {
            with_low_stock.insert(report.patient_id);
        }
        if report.counts.low_adherence {
            with_low_adherence.insert(report.patient_id);
        }
        alerts.extend(report.alerts);
    }

    sort_alerts(&mut alerts);

    PanelAlertReport {
        member_id,
        view,
        alerts,
        patients,
        patients_with_missed: with_missed.len(),
        patients_with_low_stock: with_low_stock.len(),
        patients_with_low_adherence: with_low_adherence.len(),
    }
}
