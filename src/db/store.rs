//! The record-store surface the adherence engine reads from and writes to.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use uuid::Uuid;

use super::{repository, DatabaseError};
use crate::models::enums::CareRole;
use crate::models::{DailyAdherenceStat, DoseLog, Medicine, MissedCount, User, WindowCounts};

/// Query/write interface consumed by the engine.
///
/// Date ranges are inclusive calendar dates compared against the date part
/// of `scheduled_time`.
pub trait AdherenceStore {
    fn user(&self, id: &Uuid) -> Result<Option<User>, DatabaseError>;

    fn linked_patients(&self, member_id: &Uuid, role: CareRole) -> Result<Vec<User>, DatabaseError>;

    fn medicine(&self, id: &Uuid) -> Result<Option<Medicine>, DatabaseError>;

    fn medicines(&self, patient_id: &Uuid) -> Result<Vec<Medicine>, DatabaseError>;

    fn window_counts(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<WindowCounts, DatabaseError>;

    fn dose_logs(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DoseLog>, DatabaseError>;

    fn taken_logs_for_slot(
        &self,
        patient_id: &Uuid,
        medicine_id: &Uuid,
        slot: NaiveTime,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DoseLog>, DatabaseError>;

    fn missed_by_medicine(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MissedCount>, DatabaseError>;

    /// Pending doses scheduled more than `grace_minutes` before `now` become
    /// missed. Returns how many changed.
    fn expire_overdue_doses(
        &self,
        patient_id: &Uuid,
        now: NaiveDateTime,
        grace_minutes: i64,
    ) -> Result<usize, DatabaseError>;

    fn upsert_daily_stat(&self, stat: &DailyAdherenceStat) -> Result<(), DatabaseError>;

    /// Up to `limit` most recent rows, oldest first.
    fn recent_daily_stats(
        &self,
        patient_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<DailyAdherenceStat>, DatabaseError>;
}

impl AdherenceStore for Connection {
    fn user(&self, id: &Uuid) -> Result<Option<User>, DatabaseError> {
        repository::get_user(self, id)
    }

    fn linked_patients(&self, member_id: &Uuid, role: CareRole) -> Result<Vec<User>, DatabaseError> {
        repository::get_linked_patients(self, member_id, role)
    }

    fn medicine(&self, id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
        repository::get_medicine(self, id)
    }

    fn medicines(&self, patient_id: &Uuid) -> Result<Vec<Medicine>, DatabaseError> {
        repository::get_medicines_for_patient(self, patient_id)
    }

    fn window_counts(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<WindowCounts, DatabaseError> {
        repository::count_doses_in_window(self, patient_id, from, to)
    }

    fn dose_logs(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DoseLog>, DatabaseError> {
        repository::get_dose_logs_in_window(self, patient_id, from, to)
    }

    fn taken_logs_for_slot(
        &self,
        patient_id: &Uuid,
        medicine_id: &Uuid,
        slot: NaiveTime,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DoseLog>, DatabaseError> {
        repository::get_taken_logs_for_slot(self, patient_id, medicine_id, slot, from, to)
    }

    fn missed_by_medicine(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MissedCount>, DatabaseError> {
        repository::count_missed_by_medicine(self, patient_id, from, to)
    }

    fn expire_overdue_doses(
        &self,
        patient_id: &Uuid,
        now: NaiveDateTime,
        grace_minutes: i64,
    ) -> Result<usize, DatabaseError> {
        repository::expire_overdue_doses(self, patient_id, now, grace_minutes)
    }

    fn upsert_daily_stat(&self, stat: &DailyAdherenceStat) -> Result<(), DatabaseError> {
        repository::upsert_daily_stat(self, stat)
    }

    fn recent_daily_stats(
        &self,
        patient_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<DailyAdherenceStat>, DatabaseError> {
        repository::get_recent_daily_stats(self, patient_id, limit)
    }
}
