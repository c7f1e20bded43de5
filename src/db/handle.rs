//! Process-wide handle to the record store.
//!
//! The connection is opened on first use and can be closed explicitly;
//! the next call after `close` reopens it. Components receive the handle
//! by reference instead of reaching for a global.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use uuid::Uuid;

use super::sqlite::{open_database, open_memory_database};
use super::store::AdherenceStore;
use super::DatabaseError;
use crate::models::enums::CareRole;
use crate::models::{DailyAdherenceStat, DoseLog, Medicine, MissedCount, User, WindowCounts};

enum Location {
    File(PathBuf),
    Memory,
}

pub struct DatabaseHandle {
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl DatabaseHandle {
    /// Handle to a database file. Nothing is opened until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: Mutex::new(None),
        }
    }

    /// In-memory database, opened immediately. Closing it discards the data.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            location: Location::Memory,
            conn: Mutex::new(Some(open_memory_database()?)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Run `f` against the connection, opening it first if needed.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let mut guard = self.lock()?;
        if guard.is_none() {
            let conn = match &self.location {
                Location::File(path) => {
                    tracing::info!(path = %path.display(), "Opening record store");
                    open_database(path)?
                }
                Location::Memory => open_memory_database()?,
            };
            *guard = Some(conn);
        }
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(DatabaseError::LockPoisoned),
        }
    }

    /// Close the connection if open. Safe to call repeatedly.
    pub fn close(&self) -> Result<(), DatabaseError> {
        let mut guard = self.lock()?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))?;
            tracing::info!("Record store closed");
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl AdherenceStore for DatabaseHandle {
    fn user(&self, id: &Uuid) -> Result<Option<User>, DatabaseError> {
        self.with_conn(|conn| conn.user(id))
    }

    fn linked_patients(&self, member_id: &Uuid, role: CareRole) -> Result<Vec<User>, DatabaseError> {
        self.with_conn(|conn| conn.linked_patients(member_id, role))
    }

    fn medicine(&self, id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
        self.with_conn(|conn| conn.medicine(id))
    }

    fn medicines(&self, patient_id: &Uuid) -> Result<Vec<Medicine>, DatabaseError> {
        self.with_conn(|conn| conn.medicines(patient_id))
    }

    fn window_counts(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<WindowCounts, DatabaseError> {
        self.with_conn(|conn| conn.window_counts(patient_id, from, to))
    }

    fn dose_logs(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DoseLog>, DatabaseError> {
        self.with_conn(|conn| conn.dose_logs(patient_id, from, to))
    }

    fn taken_logs_for_slot(
        &self,
        patient_id: &Uuid,
        medicine_id: &Uuid,
        slot: NaiveTime,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DoseLog>, DatabaseError> {
        self.with_conn(|conn| conn.taken_logs_for_slot(patient_id, medicine_id, slot, from, to))
    }

    fn missed_by_medicine(
        &self,
        patient_id: &Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MissedCount>, DatabaseError> {
        self.with_conn(|conn| conn.missed_by_medicine(patient_id, from, to))
    }

    fn expire_overdue_doses(
        &self,
        patient_id: &Uuid,
        now: NaiveDateTime,
        grace_minutes: i64,
    ) -> Result<usize, DatabaseError> {
        self.with_conn(|conn| conn.expire_overdue_doses(patient_id, now, grace_minutes))
    }

    fn upsert_daily_stat(&self, stat: &DailyAdherenceStat) -> Result<(), DatabaseError> {
        self.with_conn(|conn| conn.upsert_daily_stat(stat))
    }

    fn recent_daily_stats(
        &self,
        patient_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<DailyAdherenceStat>, DatabaseError> {
        self.with_conn(|conn| conn.recent_daily_stats(patient_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::make_user;
    use crate::models::enums::UserRole;

    #[test]
    fn file_handle_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let handle = DatabaseHandle::new(dir.path().join("nested").join("store.db"));
        assert!(!handle.is_open());

        let id = handle.with_conn(|conn| Ok(make_user(conn, "Ada", UserRole::Patient))).unwrap();
        assert!(handle.is_open());
        assert!(handle.user(&id).unwrap().is_some());
    }

    #[test]
    fn close_then_reopen_keeps_file_data() {
        let dir = tempfile::tempdir().unwrap();
        let handle = DatabaseHandle::new(dir.path().join("store.db"));
        let id = handle.with_conn(|conn| Ok(make_user(conn, "Ada", UserRole::Patient))).unwrap();

        handle.close().unwrap();
        assert!(!handle.is_open());
        handle.close().unwrap();

        let user = handle.user(&id).unwrap().unwrap();
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn memory_handle_has_no_path() {
        let handle = DatabaseHandle::in_memory().unwrap();
        assert!(handle.is_open());
        assert!(handle.path().is_none());
    }
}
