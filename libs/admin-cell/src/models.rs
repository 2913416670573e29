use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use appointment_cell::AppointmentError;
use auth_cell::AuthError;
use faq_cell::FaqError;
use patient_cell::PatientError;
use shared_models::error::AppError;

/// Dashboard figures for the administration home page.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub users_by_role: BTreeMap<String, i64>,
    pub total_patients: i64,
    pub appointments_by_status: BTreeMap<String, i64>,
    pub appointments_today: i64,
    pub upcoming_appointments: i64,
    pub pending_questions: i64,
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Faq(#[from] FaqError),
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Auth(e) => AppError::from(e),
            AdminError::Patient(e) => AppError::from(e),
            AdminError::Appointment(e) => AppError::from(e),
            AdminError::Faq(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_errors_keep_their_status() {
        assert_matches!(
            AppError::from(AdminError::from(PatientError::NotFound)),
            AppError::NotFound(_)
        );
        assert_matches!(
            AppError::from(AdminError::from(AuthError::SelfDeletion)),
            AppError::BadRequest(_)
        );
    }
}
