use serde::Deserialize;

use shared_models::auth::{AuthUser, Role};

/// Doctors act on their own schedule; administrators on anyone's.
pub fn doctor_scope(user: &AuthUser) -> Option<i64> {
    (user.role == Role::Doctor).then_some(user.id)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    /// Only patients followed by the calling doctor.
    pub mine: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
