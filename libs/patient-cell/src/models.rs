use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use shared_models::Language;
use shared_utils::validation::FieldErrors;

// ==============================================================================
// CLIENT (PATIENT RECORD) MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ContactPreference {
    #[default]
    Email,
    Phone,
    Sms,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub preferred_language: Language,
    pub contact_preference: ContactPreference,
    pub primary_doctor_id: Option<i64>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    /// Staff-only remarks, hidden from the patient portal.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// What a patient sees of their own record.
#[derive(Debug, Clone, Serialize)]
pub struct PatientProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub preferred_language: Language,
    pub contact_preference: ContactPreference,
    pub primary_doctor_id: Option<i64>,
    pub allergies: Option<String>,
}

impl From<Client> for PatientProfile {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            first_name: client.first_name,
            last_name: client.last_name,
            email: client.email,
            phone: client.phone,
            date_of_birth: client.date_of_birth,
            address: client.address,
            preferred_language: client.preferred_language,
            contact_preference: client.contact_preference,
            primary_doctor_id: client.primary_doctor_id,
            allergies: client.allergies,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateClientRequest {
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub preferred_language: Option<Language>,
    pub contact_preference: Option<ContactPreference>,
    pub primary_doctor_id: Option<i64>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub preferred_language: Language,
    pub contact_preference: ContactPreference,
    pub primary_doctor_id: Option<i64>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub notes: Option<String>,
}

impl CreateClientRequest {
    pub fn validate(self) -> Result<NewClient, AppError> {
        let mut errors = FieldErrors::new();

        errors.required(&self.first_name, "first_name");
        errors.required(&self.last_name, "last_name");
        errors.email(&self.email, "email");
        errors.phone(&self.phone, "phone");
        let date_of_birth = self
            .date_of_birth
            .as_deref()
            .and_then(|d| errors.date(d, "date_of_birth"));

        errors.into_result()?;

        Ok(NewClient {
            user_id: self.user_id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone,
            date_of_birth,
            address: self.address,
            preferred_language: self.preferred_language.unwrap_or_default(),
            contact_preference: self.contact_preference.unwrap_or_default(),
            primary_doctor_id: self.primary_doctor_id,
            allergies: self.allergies,
            medical_history: self.medical_history,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub preferred_language: Option<Language>,
    pub contact_preference: Option<ContactPreference>,
    pub primary_doctor_id: Option<i64>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub notes: Option<String>,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub preferred_language: Option<Language>,
    pub contact_preference: Option<ContactPreference>,
    pub primary_doctor_id: Option<i64>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub notes: Option<String>,
}

impl UpdateClientRequest {
    pub fn validate(self) -> Result<ClientChanges, AppError> {
        let mut errors = FieldErrors::new();

        if let Some(first_name) = &self.first_name {
            errors.required(first_name, "first_name");
        }
        if let Some(last_name) = &self.last_name {
            errors.required(last_name, "last_name");
        }
        if let Some(email) = &self.email {
            errors.email(email, "email");
        }
        if let Some(phone) = &self.phone {
            errors.phone(phone, "phone");
        }
        let date_of_birth = self
            .date_of_birth
            .as_deref()
            .and_then(|d| errors.date(d, "date_of_birth"));

        errors.into_result()?;

        Ok(ClientChanges {
            first_name: self.first_name.map(|v| v.trim().to_string()),
            last_name: self.last_name.map(|v| v.trim().to_string()),
            email: self.email.map(|v| v.trim().to_lowercase()),
            phone: self.phone,
            date_of_birth,
            address: self.address,
            preferred_language: self.preferred_language,
            contact_preference: self.contact_preference,
            primary_doctor_id: self.primary_doctor_id,
            allergies: self.allergies,
            medical_history: self.medical_history,
            notes: self.notes,
        })
    }
}

/// Fields a patient may change on their own record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub preferred_language: Option<Language>,
    pub contact_preference: Option<ContactPreference>,
    pub allergies: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateClientRequest {
    fn from(profile: UpdateProfileRequest) -> Self {
        Self {
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            date_of_birth: profile.date_of_birth,
            address: profile.address,
            preferred_language: profile.preferred_language,
            contact_preference: profile.contact_preference,
            allergies: profile.allergies,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ==============================================================================
// MEDICAL NOTE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicalNote {
    pub id: i64,
    pub client_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    pub content: String,
    pub is_private: bool,
    pub doctor_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMedicalNoteRequest {
    pub content: String,
    pub appointment_id: Option<i64>,
    /// Notes are private unless explicitly shared with the patient.
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicalNote {
    pub content: String,
    pub appointment_id: Option<i64>,
    pub is_private: bool,
}

impl CreateMedicalNoteRequest {
    pub fn validate(self) -> Result<NewMedicalNote, AppError> {
        let mut errors = FieldErrors::new();
        errors.required(&self.content, "content");
        errors.into_result()?;

        Ok(NewMedicalNote {
            content: self.content,
            appointment_id: self.appointment_id,
            is_private: self.is_private.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMedicalNoteRequest {
    pub content: Option<String>,
    pub is_private: Option<bool>,
}

impl UpdateMedicalNoteRequest {
    pub fn validate(self) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        if let Some(content) = &self.content {
            errors.required(content, "content");
        }
        errors.into_result()?;
        Ok(self)
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("No patient record is linked to this account")]
    NoLinkedRecord,

    #[error("Medical note not found")]
    NoteNotFound,

    #[error("Only the author may modify this note")]
    NotAuthor,

    #[error("Appointment does not belong to this patient")]
    ForeignAppointment,

    #[error("Doctor {0} does not exist")]
    UnknownDoctor(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound | PatientError::NoLinkedRecord | PatientError::NoteNotFound => {
                AppError::NotFound(err.to_string())
            }
            PatientError::NotAuthor => AppError::Forbidden(err.to_string()),
            PatientError::ForeignAppointment => AppError::validation("appointment_id", &err.to_string()),
            PatientError::UnknownDoctor(_) => AppError::validation("primary_doctor_id", &err.to_string()),
            PatientError::Database(e) => AppError::from(e),
        }
    }
}
