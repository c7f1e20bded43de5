use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CareRole, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub created_at: NaiveDateTime,
}

/// Read access granted by a patient to a caregiver or doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareLink {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub member_id: Uuid,
    pub role: CareRole,
    pub created_at: NaiveDateTime,
}
