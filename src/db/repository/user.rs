use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{CareRole, UserRole};
use crate::models::{CareLink, User};

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, name, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.id.to_string(),
            user.name,
            user.role.as_str(),
            format_timestamp(&user.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, role, created_at FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(user_from_row).transpose()
}

pub fn insert_care_link(conn: &Connection, link: &CareLink) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO care_links (id, patient_id, member_id, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            link.id.to_string(),
            link.patient_id.to_string(),
            link.member_id.to_string(),
            link.role.as_str(),
            format_timestamp(&link.created_at),
        ],
    )?;
    Ok(())
}

/// Patients that granted `member_id` access under `role`, ordered by name.
pub fn get_linked_patients(
    conn: &Connection,
    member_id: &Uuid,
    role: CareRole,
) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.name, u.role, u.created_at
         FROM care_links l
         JOIN users u ON u.id = l.patient_id
         WHERE l.member_id = ?1 AND l.role = ?2
         ORDER BY u.name ASC, u.id ASC",
    )?;

    let rows = stmt.query_map(params![member_id.to_string(), role.as_str()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

fn user_from_row(
    (id, name, role, created_at): (String, String, String, String),
) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid(&id)?,
        name,
        role: UserRole::from_str(&role)?,
        created_at: parse_timestamp(&created_at).unwrap_or_default(),
    })
}
