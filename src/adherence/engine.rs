use std::time::Instant;

use chrono::{Local, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::AdherenceStore;
use crate::models::enums::{CareRole, TrendDirection};
use crate::models::{parse_clock_time, DailyAdherenceStat, Medicine, User, WindowCounts};

use super::adaptive::{adaptive_reminder, summarize};
use super::alerts::{evaluate_alerts, merge_reports, AlertInputs};
use super::stats::build_details;
use super::trend::classify_trend;
use super::types::{
    AdaptiveReminder, AdaptiveSummary, AdherenceDetails, AdherenceError, AlertReport, AlertView,
    PanelAlertReport,
};
use super::window::{rate, trailing_start, AdherenceWindow};

/// Read-compute-(optionally write) front end over an injected record store.
///
/// Every operation is a pure re-derivation from the store, so callers may
/// retry freely. The only write is the daily stat upsert.
pub struct AdherenceEngine<'a, S: AdherenceStore + ?Sized> {
    store: &'a S,
    config: EngineConfig,
    reference_time: Option<NaiveDateTime>,
}

impl<'a, S: AdherenceStore + ?Sized> AdherenceEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            reference_time: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin "now" instead of reading the local clock.
    pub fn with_reference_time(mut self, now: NaiveDateTime) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> NaiveDateTime {
        self.reference_time
            .unwrap_or_else(|| Local::now().naive_local())
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn require_user(&self, id: &Uuid) -> Result<User, AdherenceError> {
        self.store
            .user(id)?
            .ok_or(AdherenceError::UserNotFound(*id))
    }

    // ── Aggregation & statistics ────────────────────────────

    pub fn window_counts(
        &self,
        patient_id: &Uuid,
        window: AdherenceWindow,
    ) -> Result<WindowCounts, AdherenceError> {
        let (from, to) = window.bounds(self.today(), &self.config);
        Ok(self.store.window_counts(patient_id, from, to)?)
    }

    /// Adherence percentage over `window`; 100 when nothing was scheduled.
    pub fn rate(&self, patient_id: &Uuid, window: AdherenceWindow) -> Result<u32, AdherenceError> {
        Ok(rate(self.window_counts(patient_id, window)?))
    }

    /// Recompute and store the stat row for `date`, overwriting any previous row.
    pub fn upsert_daily_stat(
        &self,
        patient_id: &Uuid,
        date: NaiveDate,
    ) -> Result<DailyAdherenceStat, AdherenceError> {
        let counts = self.store.window_counts(patient_id, date, date)?;
        let stat = DailyAdherenceStat {
            patient_id: *patient_id,
            date,
            total_doses: counts.total,
            taken_doses: counts.taken,
            adherence_rate: f64::from(rate(counts)),
        };
        self.store.upsert_daily_stat(&stat)?;

        tracing::info!(
            patient_id = %patient_id,
            date = %date,
            total = counts.total,
            taken = counts.taken,
            rate = stat.adherence_rate,
            "Daily adherence stat upserted"
        );
        Ok(stat)
    }

    /// Resolve the patient's overdue pending doses to missed, using the
    /// configured grace period. Returns how many doses changed.
    pub fn expire_overdue(&self, patient_id: &Uuid) -> Result<usize, AdherenceError> {
        self.require_user(patient_id)?;
        let now = self.now();
        let changed = self.store.expire_overdue_doses(
            patient_id,
            now,
            self.config.overdue_grace_minutes,
        )?;

        tracing::info!(
            patient_id = %patient_id,
            grace_minutes = self.config.overdue_grace_minutes,
            expired = changed,
            "Overdue doses expired"
        );
        Ok(changed)
    }

    /// Monthly composite report.
    pub fn details(&self, patient_id: &Uuid) -> Result<AdherenceDetails, AdherenceError> {
        self.require_user(patient_id)?;
        let (from, to) = AdherenceWindow::Month.bounds(self.today(), &self.config);
        let logs = self.store.dose_logs(patient_id, from, to)?;
        let weekly = self.rate(patient_id, AdherenceWindow::Week)?;
        Ok(build_details(&logs, weekly, self.config.monthly_window_days))
    }

    // ── Adaptive reminders ──────────────────────────────────

    /// Reminder timing for one configured clock time of a medicine.
    pub fn adaptive_reminder_time(
        &self,
        patient_id: &Uuid,
        medicine_id: &Uuid,
        scheduled_time: &str,
    ) -> Result<AdaptiveReminder, AdherenceError> {
        let slot = parse_clock_time(scheduled_time)
            .ok_or_else(|| AdherenceError::InvalidClockTime(scheduled_time.to_string()))?;

        let to = self.today();
        let from = trailing_start(to, self.config.adaptive_window_days);
        let logs = self
            .store
            .taken_logs_for_slot(patient_id, medicine_id, slot, from, to)?;
        let reminder = adaptive_reminder(*medicine_id, slot, &logs, self.config.adaptive_min_days);

        tracing::debug!(
            patient_id = %patient_id,
            medicine_id = %medicine_id,
            scheduled = %reminder.scheduled_time,
            adaptive = %reminder.adaptive_time,
            days_analyzed = reminder.days_analyzed,
            "Adaptive reminder computed"
        );
        Ok(reminder)
    }

    /// A medicine, provided it belongs to `patient_id`.
    pub fn patient_medicine(
        &self,
        patient_id: &Uuid,
        medicine_id: &Uuid,
    ) -> Result<Medicine, AdherenceError> {
        self.store
            .medicine(medicine_id)?
            .filter(|m| m.patient_id == *patient_id)
            .ok_or(AdherenceError::MedicineNotFound(*medicine_id))
    }

    /// One adaptive reminder per configured clock time of the medicine.
    pub fn medicine_schedule(
        &self,
        patient_id: &Uuid,
        medicine_id: &Uuid,
    ) -> Result<Vec<AdaptiveReminder>, AdherenceError> {
        let medicine = self.patient_medicine(patient_id, medicine_id)?;
        self.schedule_for(&medicine)
    }

    /// `medicine_schedule` for an already loaded medicine.
    pub fn schedule_for(&self, medicine: &Medicine) -> Result<Vec<AdaptiveReminder>, AdherenceError> {
        let mut schedule = Vec::with_capacity(medicine.times.len());
        for time in &medicine.times {
            if parse_clock_time(time).is_none() {
                tracing::warn!(medicine_id = %medicine.id, value = %time, "Skipping unreadable clock time");
                continue;
            }
            schedule.push(self.adaptive_reminder_time(&medicine.patient_id, &medicine.id, time)?);
        }
        Ok(schedule)
    }

    /// How many of the patient's medicines have adapted reminders.
    pub fn adaptive_summary(&self, patient_id: &Uuid) -> Result<AdaptiveSummary, AdherenceError> {
        self.require_user(patient_id)?;
        let medicines = self.store.medicines(patient_id)?;
        let schedules = medicines
            .iter()
            .map(|m| self.schedule_for(m))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summarize(*patient_id, &schedules))
    }

    // ── Alerts ──────────────────────────────────────────────

    fn alerts_for(&self, patient: &User, view: AlertView) -> Result<AlertReport, AdherenceError> {
        let (from, to) = AdherenceWindow::Month.bounds(self.today(), &self.config);
        let missed = self.store.missed_by_medicine(&patient.id, from, to)?;
        let medicines = self.store.medicines(&patient.id)?;
        let weekly_rate = self.rate(&patient.id, AdherenceWindow::Week)?;

        let patient_name = (view != AlertView::Patient).then_some(patient.name.as_str());
        let inputs = AlertInputs {
            patient_id: patient.id,
            patient_name,
            missed: &missed,
            medicines: &medicines,
            weekly_rate,
        };
        Ok(evaluate_alerts(&inputs, view, &self.config, self.now()))
    }

    /// Alerts a patient sees about their own medicines.
    pub fn patient_alerts(&self, patient_id: &Uuid) -> Result<AlertReport, AdherenceError> {
        let start = Instant::now();
        let patient = self.require_user(patient_id)?;
        let report = self.alerts_for(&patient, AlertView::Patient)?;

        tracing::info!(
            patient_id = %patient_id,
            alerts = report.alerts.len(),
            missed = report.counts.missed,
            low_stock = report.counts.low_stock,
            low_adherence = report.counts.low_adherence,
            processing_ms = start.elapsed().as_millis() as u64,
            "Patient alerts evaluated"
        );
        Ok(report)
    }

    /// Patient-path alerts for every patient linked to a caregiver.
    pub fn caregiver_alerts(&self, caregiver_id: &Uuid) -> Result<PanelAlertReport, AdherenceError> {
        self.panel_alerts(caregiver_id, CareRole::Caregiver, AlertView::Caregiver)
    }

    /// Doctor-path alerts (with the mid-range adherence warning) for a doctor's panel.
    pub fn doctor_alerts(&self, doctor_id: &Uuid) -> Result<PanelAlertReport, AdherenceError> {
        self.panel_alerts(doctor_id, CareRole::Doctor, AlertView::Doctor)
    }

    fn panel_alerts(
        &self,
        member_id: &Uuid,
        role: CareRole,
        view: AlertView,
    ) -> Result<PanelAlertReport, AdherenceError> {
        let start = Instant::now();
        self.require_user(member_id)?;
        let patients = self.store.linked_patients(member_id, role)?;

        let reports = patients
            .iter()
            .map(|p| self.alerts_for(p, view))
            .collect::<Result<Vec<_>, _>>()?;
        let panel = merge_reports(*member_id, view, reports);

        tracing::info!(
            member_id = %member_id,
            role = role.as_str(),
            patients = panel.patients,
            alerts = panel.alerts.len(),
            processing_ms = start.elapsed().as_millis() as u64,
            "Panel alerts evaluated"
        );
        Ok(panel)
    }

    // ── Trend ───────────────────────────────────────────────

    /// Direction of the last `days` stored daily rates.
    pub fn predict_trend(&self, patient_id: &Uuid, days: u32) -> Result<TrendDirection, AdherenceError> {
        if days == 0 {
            return Err(AdherenceError::InvalidWindow(days));
        }
        let stats = self.store.recent_daily_stats(patient_id, days)?;
        let rates: Vec<f64> = stats.iter().map(|s| s.adherence_rate).collect();
        Ok(classify_trend(&rates, self.config.trend_min_points, self.config.trend_delta))
    }

    /// `predict_trend` over the configured default window.
    pub fn trend(&self, patient_id: &Uuid) -> Result<TrendDirection, AdherenceError> {
        self.predict_trend(patient_id, self.config.trend_window_days)
    }
}
