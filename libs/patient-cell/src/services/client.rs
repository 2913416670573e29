use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use shared_database::AppState;
use shared_utils::pagination::{Paginated, Pagination};

use crate::models::{Client, ClientChanges, NewClient, PatientError};

const CLIENT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, date_of_birth, address, \
     preferred_language, contact_preference, primary_doctor_id, allergies, medical_history, notes, \
     created_at, updated_at";

pub struct ClientService {
    db: SqlitePool,
}

impl ClientService {
    pub fn new(state: &AppState) -> Self {
        Self { db: state.db.clone() }
    }

    pub async fn create(&self, input: &NewClient) -> Result<Client, PatientError> {
        let mut conn = self.db.acquire().await?;
        let client = Self::insert(&mut conn, input).await?;
        info!("Patient record {} created", client.id);
        Ok(client)
    }

    /// Inserts on an existing connection so callers can include the record
    /// in a wider transaction.
    pub async fn insert(conn: &mut SqliteConnection, input: &NewClient) -> Result<Client, PatientError> {
        debug!("Inserting patient record for {}", input.email);
        ensure_doctor(conn, input.primary_doctor_id).await?;

        let now = Utc::now();
        let client = sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clients (user_id, first_name, last_name, email, phone, date_of_birth, address,
                                  preferred_language, contact_preference, primary_doctor_id, allergies,
                                  medical_history, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(input.user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.date_of_birth)
        .bind(&input.address)
        .bind(input.preferred_language)
        .bind(input.contact_preference)
        .bind(input.primary_doctor_id)
        .bind(&input.allergies)
        .bind(&input.medical_history)
        .bind(&input.notes)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(client)
    }

    pub async fn get(&self, id: i64) -> Result<Client, PatientError> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE id = ? AND deleted_at IS NULL",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(PatientError::NotFound)
    }

    /// Record linked to a patient login.
    pub async fn get_by_user(&self, user_id: i64) -> Result<Client, PatientError> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE user_id = ? AND deleted_at IS NULL",
            CLIENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(PatientError::NoLinkedRecord)
    }

    pub async fn update(&self, id: i64, changes: ClientChanges) -> Result<Client, PatientError> {
        debug!("Updating patient record {}", id);
        let mut conn = self.db.acquire().await?;
        ensure_doctor(&mut conn, changes.primary_doctor_id).await?;

        sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                date_of_birth = COALESCE(?, date_of_birth),
                address = COALESCE(?, address),
                preferred_language = COALESCE(?, preferred_language),
                contact_preference = COALESCE(?, contact_preference),
                primary_doctor_id = COALESCE(?, primary_doctor_id),
                allergies = COALESCE(?, allergies),
                medical_history = COALESCE(?, medical_history),
                notes = COALESCE(?, notes),
                updated_at = ?
             WHERE id = ? AND deleted_at IS NULL
             RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.date_of_birth)
        .bind(changes.address)
        .bind(changes.preferred_language)
        .bind(changes.contact_preference)
        .bind(changes.primary_doctor_id)
        .bind(changes.allergies)
        .bind(changes.medical_history)
        .bind(changes.notes)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(PatientError::NotFound)
    }

    /// Case-insensitive substring match on name, email or phone.
    pub async fn search(
        &self,
        term: Option<&str>,
        pagination: Pagination,
    ) -> Result<Paginated<Client>, PatientError> {
        let pattern = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("%{}%", t));

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM clients WHERE deleted_at IS NULL");
        push_search(&mut count_query, pattern.as_deref());
        let total = count_query.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM clients WHERE deleted_at IS NULL",
            CLIENT_COLUMNS
        ));
        push_search(&mut query, pattern.as_deref());
        query.push(" ORDER BY last_name, first_name, id LIMIT ");
        query.push_bind(pagination.limit());
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let items = query.build_query_as::<Client>().fetch_all(&self.db).await?;
        Ok(Paginated::new(items, total, pagination))
    }

    /// Patients who have at least one appointment with `doctor_id`.
    pub async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Client>, PatientError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients
             WHERE deleted_at IS NULL AND (
                 primary_doctor_id = ?
                 OR id IN (SELECT client_id FROM appointments WHERE doctor_id = ? AND deleted_at IS NULL)
             )
             ORDER BY last_name, first_name",
            CLIENT_COLUMNS
        ))
        .bind(doctor_id)
        .bind(doctor_id)
        .fetch_all(&self.db)
        .await?;

        Ok(clients)
    }

    pub async fn soft_delete(&self, id: i64) -> Result<(), PatientError> {
        let result = sqlx::query(
            "UPDATE clients SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PatientError::NotFound);
        }

        info!("Patient record {} deleted", id);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, PatientError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients WHERE deleted_at IS NULL")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

fn push_search(query: &mut QueryBuilder<'_, Sqlite>, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        let pattern = pattern.to_string();
        query
            .push(" AND (first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR (first_name || ' ' || last_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR email LIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// A primary doctor must be a live, active doctor account.
async fn ensure_doctor(conn: &mut SqliteConnection, doctor_id: Option<i64>) -> Result<(), PatientError> {
    let Some(doctor_id) = doctor_id else {
        return Ok(());
    };
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM users WHERE id = ? AND role = 'doctor' AND is_active = 1 AND deleted_at IS NULL",
    )
    .bind(doctor_id)
    .fetch_optional(&mut *conn)
    .await?;
    found.map(|_| ()).ok_or(PatientError::UnknownDoctor(doctor_id))
}
