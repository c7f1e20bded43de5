use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::DailyAdherenceStat;

/// Insert or overwrite the row for `(patient_id, date)`.
///
/// The row id is kept on overwrite, so re-running for the same day with
/// the same numbers leaves the stored row untouched.
pub fn upsert_daily_stat(conn: &Connection, stat: &DailyAdherenceStat) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO daily_adherence_stats (id, patient_id, date, total_doses, taken_doses,
         adherence_rate)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (patient_id, date) DO UPDATE SET
            total_doses = excluded.total_doses,
            taken_doses = excluded.taken_doses,
            adherence_rate = excluded.adherence_rate",
        params![
            Uuid::new_v4().to_string(),
            stat.patient_id.to_string(),
            stat.date.to_string(),
            stat.total_doses,
            stat.taken_doses,
            stat.adherence_rate,
        ],
    )?;
    Ok(())
}

pub fn get_daily_stat(
    conn: &Connection,
    patient_id: &Uuid,
    date: NaiveDate,
) -> Result<Option<DailyAdherenceStat>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT patient_id, date, total_doses, taken_doses, adherence_rate
             FROM daily_adherence_stats WHERE patient_id = ?1 AND date = ?2",
            params![patient_id.to_string(), date.to_string()],
            stat_row_from_rusqlite,
        )
        .optional()?;
    match row {
        Some(row) => stat_from_row(row),
        None => Ok(None),
    }
}

/// Up to `limit` most recent rows, returned oldest first.
pub fn get_recent_daily_stats(
    conn: &Connection,
    patient_id: &Uuid,
    limit: u32,
) -> Result<Vec<DailyAdherenceStat>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_id, date, total_doses, taken_doses, adherence_rate
         FROM daily_adherence_stats WHERE patient_id = ?1
         ORDER BY date DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string(), limit], stat_row_from_rusqlite)?;

    let mut stats = Vec::new();
    for row in rows {
        if let Some(stat) = stat_from_row(row?)? {
            stats.push(stat);
        }
    }
    stats.reverse();
    Ok(stats)
}

type StatRow = (String, String, u32, u32, f64);

fn stat_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<StatRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn stat_from_row(
    (patient_id, date, total_doses, taken_doses, adherence_rate): StatRow,
) -> Result<Option<DailyAdherenceStat>, DatabaseError> {
    let Ok(date) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
        tracing::warn!(value = %date, "Skipping daily stat with unreadable date");
        return Ok(None);
    };
    Ok(Some(DailyAdherenceStat {
        patient_id: parse_uuid(&patient_id)?,
        date,
        total_doses,
        taken_doses,
        adherence_rate,
    }))
}
