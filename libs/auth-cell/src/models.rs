use serde::Deserialize;
use thiserror::Error;

use patient_cell::models::{ContactPreference, CreateClientRequest, NewClient};
use patient_cell::PatientError;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::Language;
use shared_utils::validation::FieldErrors;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Patient self-registration: the login plus its patient record.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub preferred_language: Option<Language>,
    pub contact_preference: Option<ContactPreference>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub password: String,
    pub client: NewClient,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, AppError> {
        let mut errors = FieldErrors::new();
        errors.password(&self.password, "password");

        let client = CreateClientRequest {
            user_id: None,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            date_of_birth: self.date_of_birth,
            address: self.address,
            preferred_language: self.preferred_language,
            contact_preference: self.contact_preference,
            ..Default::default()
        }
        .validate();

        // Report password and record problems together.
        match client {
            Ok(client) => {
                errors.into_result()?;
                Ok(Registration {
                    password: self.password,
                    client,
                })
            }
            Err(AppError::Validation { errors: record_errors, .. }) => {
                for error in record_errors {
                    errors.add(&error.field, &error.message);
                }
                errors.into_result()?;
                Err(AppError::BadRequest("Invalid registration".to_string()))
            }
            Err(other) => Err(other),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.password(&self.new_password, "new_password");
        errors.check(
            self.new_password != self.current_password,
            "new_password",
            "New password must differ from the current one",
        );
        errors.into_result()
    }
}

// ==============================================================================
// USER ADMINISTRATION
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let mut errors = FieldErrors::new();
        errors.email(&self.email, "email");
        errors.password(&self.password, "password");
        errors.required(&self.first_name, "first_name");
        errors.required(&self.last_name, "last_name");
        if let Some(phone) = &self.phone {
            errors.phone(phone, "phone");
        }
        errors.into_result()?;

        Ok(NewUser {
            email: self.email.trim().to_lowercase(),
            password: self.password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone,
            role: self.role,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Administrative password reset.
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(mut self) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        if let Some(email) = &self.email {
            errors.email(email, "email");
        }
        if let Some(first_name) = &self.first_name {
            errors.required(first_name, "first_name");
        }
        if let Some(last_name) = &self.last_name {
            errors.required(last_name, "last_name");
        }
        if let Some(phone) = &self.phone {
            errors.phone(phone, "phone");
        }
        if let Some(password) = &self.password {
            errors.password(password, "password");
        }
        errors.into_result()?;

        self.email = self.email.map(|e| e.trim().to_lowercase());
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account has been deactivated")]
    AccountDisabled,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("You cannot delete your own account")]
    SelfDeletion,

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::WrongPassword => AppError::Auth(err.to_string()),
            AuthError::AccountDisabled => AppError::Forbidden(err.to_string()),
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::SelfDeletion => AppError::BadRequest(err.to_string()),
            AuthError::Patient(e) => AppError::from(e),
            AuthError::App(e) => e,
            AuthError::Database(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            email: "Luc@Example.com".to_string(),
            password: "Secret123".to_string(),
            first_name: "Luc".to_string(),
            last_name: "Gagnon".to_string(),
            phone: "514-555-0142".to_string(),
            date_of_birth: Some("1985-06-15".to_string()),
            address: None,
            preferred_language: None,
            contact_preference: None,
        }
    }

    #[test]
    fn test_registration_builds_client() {
        let registration = registration().validate().unwrap();
        assert_eq!(registration.client.email, "luc@example.com");
        assert_eq!(registration.client.preferred_language, Language::Fr);
    }

    #[test]
    fn test_registration_reports_all_fields() {
        let request = RegisterRequest {
            password: "weak".to_string(),
            phone: "12".to_string(),
            ..registration()
        };

        assert_matches!(
            request.validate(),
            Err(AppError::Validation { errors, .. })
                if errors.iter().any(|e| e.field == "password") && errors.iter().any(|e| e.field == "phone")
        );
    }

    #[test]
    fn test_change_password_rejects_reuse() {
        let request = ChangePasswordRequest {
            current_password: "Secret123".to_string(),
            new_password: "Secret123".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_matches!(AppError::from(AuthError::InvalidCredentials), AppError::Auth(msg) if msg == "Invalid email or password");
        assert_matches!(AppError::from(AuthError::AccountDisabled), AppError::Forbidden(_));
        assert_matches!(AppError::from(AuthError::SelfDeletion), AppError::BadRequest(_));
    }
}
