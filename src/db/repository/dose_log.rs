use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::DoseStatus;
use crate::models::{DoseLog, Medicine, MissedCount, WindowCounts};

const DOSE_LOG_COLUMNS: &str =
    "id, medicine_id, patient_id, scheduled_time, taken_at, status, notes, created_at";

struct DoseLogRow {
    id: String,
    medicine_id: String,
    patient_id: String,
    scheduled_time: String,
    taken_at: Option<String>,
    status: String,
    notes: Option<String>,
    created_at: String,
}

pub fn insert_dose_log(conn: &Connection, log: &DoseLog) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO dose_logs (id, medicine_id, patient_id, scheduled_time, taken_at, status,
         notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            log.id.to_string(),
            log.medicine_id.to_string(),
            log.patient_id.to_string(),
            format_timestamp(&log.scheduled_time),
            log.taken_at.as_ref().map(format_timestamp),
            log.status.as_str(),
            log.notes,
            format_timestamp(&log.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_dose_log(conn: &Connection, id: &Uuid) -> Result<Option<DoseLog>, DatabaseError> {
    let sql = format!("SELECT {DOSE_LOG_COLUMNS} FROM dose_logs WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], dose_log_row_from_rusqlite)
        .optional()?;

    match row {
        None => Ok(None),
        Some(row) => {
            let scheduled = row.scheduled_time.clone();
            dose_log_from_row(row)?
                .map(Some)
                .ok_or(DatabaseError::InvalidTimestamp {
                    field: "scheduled_time".into(),
                    value: scheduled,
                })
        }
    }
}

/// Total and taken doses whose scheduled calendar date lies in `[from, to]`.
pub fn count_doses_in_window(
    conn: &Connection,
    patient_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<WindowCounts, DatabaseError> {
    let (total, taken) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'taken' THEN 1 ELSE 0 END), 0)
         FROM dose_logs
         WHERE patient_id = ?1 AND date(scheduled_time) BETWEEN ?2 AND ?3",
        params![patient_id.to_string(), from.to_string(), to.to_string()],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    Ok(WindowCounts {
        total: total as u32,
        taken: taken as u32,
    })
}

/// Every dose log of a patient scheduled in `[from, to]`, oldest first.
pub fn get_dose_logs_in_window(
    conn: &Connection,
    patient_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DoseLog>, DatabaseError> {
    let sql = format!(
        "SELECT {DOSE_LOG_COLUMNS} FROM dose_logs
         WHERE patient_id = ?1 AND date(scheduled_time) BETWEEN ?2 AND ?3
         ORDER BY scheduled_time ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), from.to_string(), to.to_string()],
        dose_log_row_from_rusqlite,
    )?;
    collect_logs(rows)
}

/// Taken doses of one medicine at one daily clock time, scheduled in `[from, to]`.
pub fn get_taken_logs_for_slot(
    conn: &Connection,
    patient_id: &Uuid,
    medicine_id: &Uuid,
    slot: NaiveTime,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DoseLog>, DatabaseError> {
    let sql = format!(
        "SELECT {DOSE_LOG_COLUMNS} FROM dose_logs
         WHERE patient_id = ?1 AND medicine_id = ?2 AND status = 'taken'
           AND strftime('%H:%M', scheduled_time) = ?3
           AND date(scheduled_time) BETWEEN ?4 AND ?5
         ORDER BY scheduled_time ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            medicine_id.to_string(),
            slot.format("%H:%M").to_string(),
            from.to_string(),
            to.to_string(),
        ],
        dose_log_row_from_rusqlite,
    )?;
    collect_logs(rows)
}

/// Missed-dose count per medicine in `[from, to]`, medicines in creation order.
/// Medicines without a miss are omitted.
pub fn count_missed_by_medicine(
    conn: &Connection,
    patient_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<MissedCount>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.name, COUNT(d.id)
         FROM dose_logs d
         JOIN medicines m ON m.id = d.medicine_id
         WHERE d.patient_id = ?1 AND d.status = 'missed'
           AND date(d.scheduled_time) BETWEEN ?2 AND ?3
         GROUP BY m.id
         ORDER BY MIN(m.created_at) ASC, MIN(m.rowid) ASC",
    )?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), from.to_string(), to.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        },
    )?;

    let mut counts = Vec::new();
    for row in rows {
        let (id, name, missed) = row?;
        counts.push(MissedCount {
            medicine_id: parse_uuid(&id)?,
            medicine_name: name,
            missed: missed as u32,
        });
    }
    Ok(counts)
}

/// Create one pending log per configured clock time of `med` on `date`.
/// Occurrences that already exist are left alone. Returns how many were created.
pub fn generate_dose_logs(
    conn: &Connection,
    med: &Medicine,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let mut created = 0;
    for time in med.clock_times() {
        let scheduled = date.and_time(time);
        created += conn.execute(
            "INSERT OR IGNORE INTO dose_logs (id, medicine_id, patient_id, scheduled_time,
             taken_at, status, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, 'pending', NULL, ?5)",
            params![
                Uuid::new_v4().to_string(),
                med.id.to_string(),
                med.patient_id.to_string(),
                format_timestamp(&scheduled),
                format_timestamp(&now),
            ],
        )?;
    }
    Ok(created)
}

/// Resolve a pending dose to a terminal status in one transaction.
///
/// `Taken` stamps `taken_at` with `at` and consumes one unit of stock
/// (floored at zero). A log can only be resolved once.
pub fn record_dose_status(
    conn: &Connection,
    log_id: &Uuid,
    status: DoseStatus,
    at: NaiveDateTime,
) -> Result<DoseLog, DatabaseError> {
    if !status.is_terminal() {
        return Err(DatabaseError::ConstraintViolation(
            "a dose can only be resolved to taken, missed or skipped".into(),
        ));
    }

    let tx = conn.unchecked_transaction()?;

    let mut log = get_dose_log(&tx, log_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "DoseLog".into(),
        id: log_id.to_string(),
    })?;

    if log.status.is_terminal() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "dose log {log_id} is already {}",
            log.status
        )));
    }

    let taken_at = (status == DoseStatus::Taken).then_some(at);
    let updated = tx.execute(
        "UPDATE dose_logs SET status = ?1, taken_at = ?2 WHERE id = ?3 AND status = 'pending'",
        params![
            status.as_str(),
            taken_at.as_ref().map(format_timestamp),
            log_id.to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "dose log {log_id} was not pending when updated"
        )));
    }

    if status == DoseStatus::Taken {
        tx.execute(
            "UPDATE medicines SET stock = MAX(stock - 1, 0) WHERE id = ?1",
            params![log.medicine_id.to_string()],
        )?;
    }

    tx.commit()?;

    log.status = status;
    log.taken_at = taken_at;
    Ok(log)
}

/// Mark pending doses scheduled more than `grace_minutes` before `now` as missed.
pub fn expire_overdue_doses(
    conn: &Connection,
    patient_id: &Uuid,
    now: NaiveDateTime,
    grace_minutes: i64,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE dose_logs SET status = 'missed'
         WHERE patient_id = ?1 AND status = 'pending'
           AND datetime(scheduled_time, ?2) < datetime(?3)",
        params![
            patient_id.to_string(),
            format!("+{} minutes", grace_minutes.max(0)),
            format_timestamp(&now),
        ],
    )?;
    Ok(changed)
}

fn collect_logs(
    rows: impl Iterator<Item = Result<DoseLogRow, rusqlite::Error>>,
) -> Result<Vec<DoseLog>, DatabaseError> {
    let mut logs = Vec::new();
    for row in rows {
        if let Some(log) = dose_log_from_row(row?)? {
            logs.push(log);
        }
    }
    Ok(logs)
}

fn dose_log_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DoseLogRow, rusqlite::Error> {
    Ok(DoseLogRow {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        patient_id: row.get(2)?,
        scheduled_time: row.get(3)?,
        taken_at: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// `None` when the scheduled time is unreadable; such rows are left out of
/// every computation rather than failing it.
fn dose_log_from_row(row: DoseLogRow) -> Result<Option<DoseLog>, DatabaseError> {
    let Some(scheduled_time) = parse_timestamp(&row.scheduled_time) else {
        tracing::warn!(
            dose_log_id = %row.id,
            value = %row.scheduled_time,
            "Skipping dose log with unreadable scheduled_time"
        );
        return Ok(None);
    };

    let taken_at = match row.taken_at.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                tracing::warn!(dose_log_id = %row.id, value = %raw, "Unreadable taken_at ignored");
            }
            parsed
        }
    };

    Ok(Some(DoseLog {
        id: parse_uuid(&row.id)?,
        medicine_id: parse_uuid(&row.medicine_id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        scheduled_time,
        taken_at,
        status: DoseStatus::from_str(&row.status)?,
        notes: row.notes,
        created_at: parse_timestamp(&row.created_at).unwrap_or(scheduled_time),
    }))
}
