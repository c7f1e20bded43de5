//! Repository layer: entity-scoped database operations.
//!
//! The adherence engine never calls these directly; it goes through the
//! `AdherenceStore` trait, implemented on top of them for `Connection`
//! and `DatabaseHandle`.

mod daily_stat;
mod dose_log;
mod medicine;
mod user;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::DatabaseError;

pub use daily_stat::*;
pub use dose_log::*;
pub use medicine::*;
pub use user::*;

/// Storage format for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts the ISO `T` separator and a trailing `Z`.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_end_matches('Z');
    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
