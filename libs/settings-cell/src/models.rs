use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use shared_models::Language;
use shared_utils::validation::FieldErrors;

pub const DEFAULT_REMINDER_HOURS: i64 = 24;
pub const DEFAULT_APPOINTMENT_DURATION: i64 = 30;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Settings {
    pub id: i64,
    pub user_id: i64,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub reminder_hours_before: i64,
    pub default_appointment_duration: i64,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub reminder_hours_before: Option<i64>,
    pub default_appointment_duration: Option<i64>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChanges {
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub reminder_hours_before: Option<i64>,
    pub default_appointment_duration: Option<i64>,
    pub language: Option<Language>,
}

impl UpdateSettingsRequest {
    pub fn validate(self) -> Result<SettingsChanges, AppError> {
        let mut errors = FieldErrors::new();
        if let Some(hours) = self.reminder_hours_before {
            errors.check(
                (1..=168).contains(&hours),
                "reminder_hours_before",
                "Reminder must be between 1 and 168 hours",
            );
        }
        if let Some(minutes) = self.default_appointment_duration {
            errors.check(
                (5..=240).contains(&minutes),
                "default_appointment_duration",
                "Duration must be between 5 and 240 minutes",
            );
        }
        let language = match self.language.as_deref().map(str::trim) {
            Some("fr") => Some(Language::Fr),
            Some("en") => Some(Language::En),
            Some(other) => {
                errors.one_of(other, &["fr", "en"], "language");
                None
            }
            None => None,
        };
        errors.into_result()?;

        Ok(SettingsChanges {
            email_notifications: self.email_notifications,
            sms_notifications: self.sms_notifications,
            reminder_hours_before: self.reminder_hours_before,
            default_appointment_duration: self.default_appointment_duration,
            language,
        })
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Database(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_bounds() {
        let request = UpdateSettingsRequest {
            reminder_hours_before: Some(169),
            default_appointment_duration: Some(4),
            ..Default::default()
        };
        assert_matches!(
            request.validate(),
            Err(AppError::Validation { errors, .. }) if errors.len() == 2
        );

        let request = UpdateSettingsRequest {
            reminder_hours_before: Some(168),
            default_appointment_duration: Some(240),
            language: Some("en".to_string()),
            ..Default::default()
        };
        let changes = request.validate().unwrap();
        assert_eq!(changes.language, Some(Language::En));
    }

    #[test]
    fn test_unknown_language() {
        let request = UpdateSettingsRequest { language: Some("de".to_string()), ..Default::default() };
        assert_matches!(
            request.validate(),
            Err(AppError::Validation { errors, .. }) if errors[0].field == "language"
        );
    }
}
