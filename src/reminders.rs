//! Reminder planning on top of an external notification scheduler.
//!
//! The engine decides *when* a reminder fires (the adaptive time of each
//! clock slot). Delivery belongs to whatever implements `ReminderScheduler`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::adherence::{AdaptiveReminder, AdherenceEngine, AdherenceError};
use crate::db::AdherenceStore;
use crate::models::parse_clock_time;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Scheduler rejected reminder: {0}")]
    Rejected(String),

    #[error("Unknown reminder handle: {0}")]
    UnknownHandle(String),

    #[error(transparent)]
    Adherence(#[from] AdherenceError),
}

/// Opaque cancel token returned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderHandle(pub String);

/// Data carried by a daily trigger, handed back to the app when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub patient_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
    /// Configured slot this reminder stands for, "HH:MM".
    pub scheduled_time: String,
}

/// Recurring daily trigger capability.
pub trait ReminderScheduler {
    fn schedule_daily(
        &self,
        at: NaiveTime,
        payload: &ReminderPayload,
    ) -> Result<ReminderHandle, SchedulerError>;

    fn cancel(&self, handle: &ReminderHandle) -> Result<(), SchedulerError>;
}

/// One slot's reminder, ready to hand to a scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedReminder {
    pub fire_at: NaiveTime,
    pub reminder: AdaptiveReminder,
    pub payload: ReminderPayload,
}

/// Plan one reminder per clock slot of a medicine, firing at the slot's
/// adaptive time.
pub fn plan_medicine_reminders<S: AdherenceStore + ?Sized>(
    engine: &AdherenceEngine<'_, S>,
    patient_id: &Uuid,
    medicine_id: &Uuid,
) -> Result<Vec<PlannedReminder>, SchedulerError> {
    let medicine = engine.patient_medicine(patient_id, medicine_id)?;
    let schedule = engine.schedule_for(&medicine)?;

    schedule
        .into_iter()
        .map(|reminder| -> Result<PlannedReminder, SchedulerError> {
            let fire_at = parse_clock_time(&reminder.adaptive_time)
                .ok_or_else(|| AdherenceError::InvalidClockTime(reminder.adaptive_time.clone()))?;
            let payload = ReminderPayload {
                patient_id: *patient_id,
                medicine_id: medicine.id,
                medicine_name: medicine.name.clone(),
                dosage: medicine.dosage.clone(),
                scheduled_time: reminder.scheduled_time.clone(),
            };
            Ok(PlannedReminder {
                fire_at,
                reminder,
                payload,
            })
        })
        .collect()
}

/// Replace a medicine's reminders: cancel `previous`, then schedule the
/// current plan. Returns the new handles in slot order.
///
/// Handles the scheduler no longer knows are ignored; any other
/// scheduler failure aborts.
pub fn reschedule_medicine_reminders<S, R>(
    engine: &AdherenceEngine<'_, S>,
    scheduler: &R,
    patient_id: &Uuid,
    medicine_id: &Uuid,
    previous: &[ReminderHandle],
) -> Result<Vec<ReminderHandle>, SchedulerError>
where
    S: AdherenceStore + ?Sized,
    R: ReminderScheduler + ?Sized,
{
    let plan = plan_medicine_reminders(engine, patient_id, medicine_id)?;

    for handle in previous {
        match scheduler.cancel(handle) {
            Ok(()) => {}
            Err(SchedulerError::UnknownHandle(id)) => {
                tracing::warn!(medicine_id = %medicine_id, handle = %id, "Reminder already gone");
            }
            Err(e) => return Err(e),
        }
    }

    let handles = plan
        .iter()
        .map(|p| scheduler.schedule_daily(p.fire_at, &p.payload))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        patient_id = %patient_id,
        medicine_id = %medicine_id,
        cancelled = previous.len(),
        scheduled = handles.len(),
        adaptive = plan.iter().filter(|p| p.reminder.is_adaptive).count(),
        "Reminders rescheduled"
    );
    Ok(handles)
}
