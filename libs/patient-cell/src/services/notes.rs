use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use shared_database::AppState;

use crate::models::{MedicalNote, NewMedicalNote, PatientError, UpdateMedicalNoteRequest};

const NOTE_SELECT: &str = "SELECT n.id, n.client_id, n.doctor_id, n.appointment_id, n.content, n.is_private,
            u.first_name || ' ' || u.last_name AS doctor_name, n.created_at, n.updated_at
     FROM medical_notes n
     JOIN users u ON u.id = n.doctor_id
     WHERE n.deleted_at IS NULL";

pub struct MedicalNoteService {
    db: SqlitePool,
}

impl MedicalNoteService {
    pub fn new(state: &AppState) -> Self {
        Self { db: state.db.clone() }
    }

    pub async fn create(
        &self,
        client_id: i64,
        doctor_id: i64,
        input: NewMedicalNote,
    ) -> Result<MedicalNote, PatientError> {
        debug!("Doctor {} writing note for patient {}", doctor_id, client_id);

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM clients WHERE id = ? AND deleted_at IS NULL")
            .bind(client_id)
            .fetch_optional(&self.db)
            .await?;
        if exists.is_none() {
            return Err(PatientError::NotFound);
        }

        if let Some(appointment_id) = input.appointment_id {
            let owner: Option<i64> = sqlx::query_scalar(
                "SELECT client_id FROM appointments WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(appointment_id)
            .fetch_optional(&self.db)
            .await?;
            if owner != Some(client_id) {
                return Err(PatientError::ForeignAppointment);
            }
        }

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO medical_notes (client_id, doctor_id, appointment_id, content, is_private, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(client_id)
        .bind(doctor_id)
        .bind(input.appointment_id)
        .bind(&input.content)
        .bind(input.is_private)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        info!("Medical note {} created", id);
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<MedicalNote, PatientError> {
        sqlx::query_as::<_, MedicalNote>(&format!("{} AND n.id = ?", NOTE_SELECT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(PatientError::NoteNotFound)
    }

    /// Newest first. Private notes are left out unless `include_private`.
    pub async fn list_for_client(
        &self,
        client_id: i64,
        include_private: bool,
    ) -> Result<Vec<MedicalNote>, PatientError> {
        let notes = sqlx::query_as::<_, MedicalNote>(&format!(
            "{} AND n.client_id = ? AND (? OR n.is_private = 0) ORDER BY n.created_at DESC, n.id DESC",
            NOTE_SELECT
        ))
        .bind(client_id)
        .bind(include_private)
        .fetch_all(&self.db)
        .await?;

        Ok(notes)
    }

    /// Notes the patient is allowed to read.
    pub async fn list_visible_to_patient(&self, client_id: i64) -> Result<Vec<MedicalNote>, PatientError> {
        self.list_for_client(client_id, false).await
    }

    /// `author` restricts the change to notes written by that doctor.
    pub async fn update(
        &self,
        id: i64,
        changes: UpdateMedicalNoteRequest,
        author: Option<i64>,
    ) -> Result<MedicalNote, PatientError> {
        let current = self.get(id).await?;
        check_author(&current, author)?;

        sqlx::query(
            "UPDATE medical_notes SET content = COALESCE(?, content), is_private = COALESCE(?, is_private), updated_at = ?
             WHERE id = ?",
        )
        .bind(changes.content)
        .bind(changes.is_private)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64, author: Option<i64>) -> Result<(), PatientError> {
        let current = self.get(id).await?;
        check_author(&current, author)?;

        sqlx::query("UPDATE medical_notes SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        info!("Medical note {} deleted", id);
        Ok(())
    }
}

fn check_author(note: &MedicalNote, author: Option<i64>) -> Result<(), PatientError> {
    match author {
        Some(doctor_id) if note.doctor_id != doctor_id => Err(PatientError::NotAuthor),
        _ => Ok(()),
    }
}
