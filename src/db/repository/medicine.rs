use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Medicine;

const MEDICINE_COLUMNS: &str =
    "id, patient_id, name, dosage, frequency, times_json, stock, instructions, created_at";

struct MedicineRow {
    id: String,
    patient_id: String,
    name: String,
    dosage: String,
    frequency: String,
    times_json: String,
    stock: i64,
    instructions: Option<String>,
    created_at: String,
}

pub fn insert_medicine(conn: &Connection, med: &Medicine) -> Result<(), DatabaseError> {
    let times_json = serde_json::to_string(&med.times).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO medicines (id, patient_id, name, dosage, frequency, times_json, stock,
         instructions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            med.id.to_string(),
            med.patient_id.to_string(),
            med.name,
            med.dosage,
            med.frequency,
            times_json,
            med.stock.max(0),
            med.instructions,
            format_timestamp(&med.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_medicine(conn: &Connection, id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
    let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], medicine_row_from_rusqlite)
        .optional()?;
    row.map(medicine_from_row).transpose()
}

/// All medicines of a patient, in creation order.
pub fn get_medicines_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Medicine>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE patient_id = ?1
         ORDER BY created_at ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], medicine_row_from_rusqlite)?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medicine_from_row(row?)?);
    }
    Ok(meds)
}

pub fn update_medicine_stock(
    conn: &Connection,
    id: &Uuid,
    stock: i64,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medicines SET stock = ?1 WHERE id = ?2",
        params![stock.max(0), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Medicine".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Deletes the medicine; its dose logs go with it (ON DELETE CASCADE).
pub fn delete_medicine_cascade(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM medicines WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

fn medicine_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicineRow, rusqlite::Error> {
    Ok(MedicineRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        times_json: row.get(5)?,
        stock: row.get(6)?,
        instructions: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn medicine_from_row(row: MedicineRow) -> Result<Medicine, DatabaseError> {
    let times: Vec<String> = serde_json::from_str(&row.times_json).unwrap_or_else(|e| {
        tracing::warn!(medicine_id = %row.id, error = %e, "Unreadable medicine times, treating as none");
        Vec::new()
    });
    Ok(Medicine {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        name: row.name,
        dosage: row.dosage,
        frequency: row.frequency,
        times,
        stock: row.stock.max(0),
        instructions: row.instructions,
        created_at: parse_timestamp(&row.created_at).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{make_medicine, make_user};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::UserRole;

    #[test]
    fn medicine_round_trips_with_times() {
        let conn = open_memory_database().unwrap();
        let patient = make_user(&conn, "Ada", UserRole::Patient);
        let id = make_medicine(&conn, patient, "Metformin", &["08:00", "20:00"], 14);

        let med = get_medicine(&conn, &id).unwrap().unwrap();
        assert_eq!(med.name, "Metformin");
        assert_eq!(med.times, vec!["08:00".to_string(), "20:00".to_string()]);
        assert_eq!(med.stock, 14);
    }

    #[test]
    fn lists_only_the_patients_medicines() {
        let conn = open_memory_database().unwrap();
        let ada = make_user(&conn, "Ada", UserRole::Patient);
        let bo = make_user(&conn, "Bo", UserRole::Patient);
        make_medicine(&conn, ada, "Aspirin", &["08:00"], 10);
        make_medicine(&conn, ada, "Metformin", &["08:00"], 10);
        make_medicine(&conn, bo, "Lisinopril", &["09:00"], 10);

        let meds = get_medicines_for_patient(&conn, &ada).unwrap();
        let names: Vec<&str> = meds.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Aspirin", "Metformin"]);
    }

    #[test]
    fn stock_update_floors_at_zero() {
        let conn = open_memory_database().unwrap();
        let patient = make_user(&conn, "Ada", UserRole::Patient);
        let id = make_medicine(&conn, patient, "Aspirin", &["08:00"], 3);
        update_medicine_stock(&conn, &id, -4).unwrap();
        assert_eq!(get_medicine(&conn, &id).unwrap().unwrap().stock, 0);
    }

    #[test]
    fn stock_update_on_unknown_medicine_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = update_medicine_stock(&conn, &Uuid::new_v4(), 3).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_medicine() {
        let conn = open_memory_database().unwrap();
        let patient = make_user(&conn, "Ada", UserRole::Patient);
        let id = make_medicine(&conn, patient, "Aspirin", &["08:00"], 3);
        delete_medicine_cascade(&conn, &id).unwrap();
        assert!(get_medicine(&conn, &id).unwrap().is_none());
    }
}
