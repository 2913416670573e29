// libs/appointment-cell/src/services/doctors.rs
use sqlx::SqlitePool;
use tracing::debug;

use shared_database::AppState;

use crate::models::{AppointmentError, DoctorSummary};

/// Read-only view of active doctor accounts.
pub struct DoctorDirectory {
    db: SqlitePool,
}

impl DoctorDirectory {
    pub fn new(state: &AppState) -> Self {
        Self { db: state.db.clone() }
    }

    pub async fn list_active_doctors(&self) -> Result<Vec<DoctorSummary>, AppointmentError> {
        debug!("Listing active doctors");

        let doctors = sqlx::query_as::<_, DoctorSummary>(
            "SELECT id, first_name, last_name, email, phone FROM users
             WHERE role = 'doctor' AND is_active = 1 AND deleted_at IS NULL
             ORDER BY last_name, first_name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(doctors)
    }

    pub async fn get_active_doctor(&self, doctor_id: i64) -> Result<DoctorSummary, AppointmentError> {
        sqlx::query_as::<_, DoctorSummary>(
            "SELECT id, first_name, last_name, email, phone FROM users
             WHERE id = ? AND role = 'doctor' AND is_active = 1 AND deleted_at IS NULL",
        )
        .bind(doctor_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppointmentError::DoctorNotFound)
    }
}
