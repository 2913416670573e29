use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use shared_database::AppState;

use crate::models::{Settings, SettingsChanges, SettingsError, DEFAULT_APPOINTMENT_DURATION, DEFAULT_REMINDER_HOURS};

const SETTINGS_COLUMNS: &str = "id, user_id, email_notifications, sms_notifications, reminder_hours_before, \
     default_appointment_duration, language, created_at, updated_at";

pub struct SettingsService {
    db: SqlitePool,
}

impl SettingsService {
    pub fn new(state: &AppState) -> Self {
        Self { db: state.db.clone() }
    }

    /// Returns the user's settings, inserting the defaults on first access.
    pub async fn get_or_create(&self, user_id: i64) -> Result<Settings, SettingsError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO settings (user_id, email_notifications, sms_notifications, reminder_hours_before,
                                   default_appointment_duration, language, created_at, updated_at)
             VALUES (?, 1, 0, ?, ?, 'fr', ?, ?)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(DEFAULT_REMINDER_HOURS)
        .bind(DEFAULT_APPOINTMENT_DURATION)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        let settings = sqlx::query_as::<_, Settings>(&format!(
            "SELECT {} FROM settings WHERE user_id = ?",
            SETTINGS_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(settings)
    }

    /// The user's preferred appointment length, without creating a settings row.
    pub async fn appointment_duration(&self, user_id: i64) -> Result<i64, SettingsError> {
        let duration: Option<i64> =
            sqlx::query_scalar("SELECT default_appointment_duration FROM settings WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(duration.unwrap_or(DEFAULT_APPOINTMENT_DURATION))
    }

    pub async fn update(&self, user_id: i64, changes: SettingsChanges) -> Result<Settings, SettingsError> {
        self.get_or_create(user_id).await?;

        let settings = sqlx::query_as::<_, Settings>(&format!(
            "UPDATE settings SET
                email_notifications = COALESCE(?, email_notifications),
                sms_notifications = COALESCE(?, sms_notifications),
                reminder_hours_before = COALESCE(?, reminder_hours_before),
                default_appointment_duration = COALESCE(?, default_appointment_duration),
                language = COALESCE(?, language),
                updated_at = ?
             WHERE user_id = ? RETURNING {}",
            SETTINGS_COLUMNS
        ))
        .bind(changes.email_notifications)
        .bind(changes.sms_notifications)
        .bind(changes.reminder_hours_before)
        .bind(changes.default_appointment_duration)
        .bind(changes.language)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        debug!("Settings updated for user {}", user_id);
        Ok(settings)
    }
}
