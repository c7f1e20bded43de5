//! `dosewise <patient-uuid> [db-path]`: print a patient's adherence report as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use dosewise_lib::adherence::{AdherenceDetails, AdherenceEngine, AlertReport};
use dosewise_lib::config;
use dosewise_lib::db::DatabaseHandle;
use dosewise_lib::models::enums::TrendDirection;

#[derive(Serialize)]
struct PatientReport {
    patient_id: Uuid,
    generated_at: NaiveDateTime,
    details: AdherenceDetails,
    trend: TrendDirection,
    alerts: AlertReport,
}

fn main() -> ExitCode {
    dosewise_lib::init_tracing();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let mut args = std::env::args().skip(1);
    let Some(patient_arg) = args.next() else {
        eprintln!("usage: dosewise <patient-uuid> [db-path]");
        return ExitCode::from(2);
    };
    let patient_id = match Uuid::parse_str(&patient_arg) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("invalid patient id {patient_arg:?}: {e}");
            return ExitCode::from(2);
        }
    };
    let db_path = args.next().map(PathBuf::from).unwrap_or_else(config::database_path);

    match run(patient_id, db_path) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(patient_id = %patient_id, error = %e, "Report failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(patient_id: Uuid, db_path: PathBuf) -> Result<String, Box<dyn std::error::Error>> {
    let store = DatabaseHandle::new(db_path);
    let engine = AdherenceEngine::new(&store);

    engine.expire_overdue(&patient_id)?;
    let details = engine.details(&patient_id)?;
    // Refresh today's row so the trend includes it.
    engine.upsert_daily_stat(&patient_id, engine.today())?;

    let report = PatientReport {
        patient_id,
        generated_at: engine.now(),
        details,
        trend: engine.trend(&patient_id)?,
        alerts: engine.patient_alerts(&patient_id)?,
    };
    store.close()?;
    Ok(serde_json::to_string_pretty(&report)?)
}
