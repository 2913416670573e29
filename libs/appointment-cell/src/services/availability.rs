// libs/appointment-cell/src/services/availability.rs
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use shared_database::AppState;

use crate::models::{
    minutes_of, ranges_overlap, Availability, AvailabilityChanges, AppointmentError, NewAvailability,
};
use crate::services::doctors::DoctorDirectory;

const AVAILABILITY_COLUMNS: &str = "id, doctor_id, date, start_time, end_time, recurrence, \
     recurrence_end_date, created_at, updated_at";

pub struct AvailabilityService {
    db: SqlitePool,
    doctors: DoctorDirectory,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            doctors: DoctorDirectory::new(state),
        }
    }

    pub async fn create(
        &self,
        doctor_id: i64,
        input: NewAvailability,
    ) -> Result<Availability, AppointmentError> {
        debug!("Creating availability for doctor {} on {}", doctor_id, input.date);

        input.check_range()?;
        self.doctors.get_active_doctor(doctor_id).await?;
        self.check_overlap(doctor_id, input.date, input.start_time, input.end_time, None)
            .await?;

        let now = Utc::now();
        let availability = sqlx::query_as::<_, Availability>(&format!(
            "INSERT INTO availabilities (doctor_id, date, start_time, end_time, recurrence, recurrence_end_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            AVAILABILITY_COLUMNS
        ))
        .bind(doctor_id)
        .bind(input.date)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.recurrence)
        .bind(input.recurrence_end_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        info!("Availability {} created for doctor {}", availability.id, doctor_id);
        Ok(availability)
    }

    pub async fn get(&self, id: i64) -> Result<Availability, AppointmentError> {
        sqlx::query_as::<_, Availability>(&format!(
            "SELECT {} FROM availabilities WHERE id = ? AND deleted_at IS NULL",
            AVAILABILITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppointmentError::AvailabilityNotFound)
    }

    /// Availabilities of `doctor_id` (all doctors when `None`). With a range,
    /// only entries with at least one occurrence inside it are returned.
    pub async fn list(
        &self,
        doctor_id: Option<i64>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Availability>, AppointmentError> {
        let mut all = match doctor_id {
            Some(doctor_id) => {
                sqlx::query_as::<_, Availability>(&format!(
                    "SELECT {} FROM availabilities WHERE doctor_id = ? AND deleted_at IS NULL ORDER BY date, start_time",
                    AVAILABILITY_COLUMNS
                ))
                .bind(doctor_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Availability>(&format!(
                    "SELECT {} FROM availabilities WHERE deleted_at IS NULL ORDER BY doctor_id, date, start_time",
                    AVAILABILITY_COLUMNS
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        if from.is_some() || to.is_some() {
            let from = from.unwrap_or(NaiveDate::MIN);
            let to = to.unwrap_or(NaiveDate::MAX);
            all.retain(|a| a.occurs_between(from, to));
        }

        Ok(all)
    }

    /// `owner` restricts the change to that doctor's own entries.
    pub async fn update(
        &self,
        id: i64,
        changes: AvailabilityChanges,
        owner: Option<i64>,
    ) -> Result<Availability, AppointmentError> {
        let current = self.get(id).await?;
        check_owner(&current, owner)?;

        let updated = NewAvailability {
            date: changes.date.unwrap_or(current.date),
            start_time: changes.start_time.unwrap_or(current.start_time),
            end_time: changes.end_time.unwrap_or(current.end_time),
            recurrence: changes.recurrence.unwrap_or(current.recurrence),
            recurrence_end_date: changes.recurrence_end_date.or(current.recurrence_end_date),
        };
        updated.check_range()?;
        self.check_overlap(
            current.doctor_id,
            updated.date,
            updated.start_time,
            updated.end_time,
            Some(id),
        )
        .await?;

        let availability = sqlx::query_as::<_, Availability>(&format!(
            "UPDATE availabilities
             SET date = ?, start_time = ?, end_time = ?, recurrence = ?, recurrence_end_date = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL RETURNING {}",
            AVAILABILITY_COLUMNS
        ))
        .bind(updated.date)
        .bind(updated.start_time)
        .bind(updated.end_time)
        .bind(updated.recurrence)
        .bind(updated.recurrence_end_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppointmentError::AvailabilityNotFound)?;

        debug!("Availability {} updated", id);
        Ok(availability)
    }

    pub async fn delete(&self, id: i64, owner: Option<i64>) -> Result<(), AppointmentError> {
        let current = self.get(id).await?;
        check_owner(&current, owner)?;

        sqlx::query("UPDATE availabilities SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        info!("Availability {} deleted", id);
        Ok(())
    }

    /// Working windows of `doctor_id` on `date`, recurrence expanded.
    pub async fn windows_on(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<(NaiveTime, NaiveTime)>, AppointmentError> {
        let candidates = sqlx::query_as::<_, Availability>(&format!(
            "SELECT {} FROM availabilities
             WHERE doctor_id = ? AND deleted_at IS NULL AND date <= ?
               AND (recurrence_end_date IS NULL OR recurrence_end_date >= ?)
             ORDER BY start_time",
            AVAILABILITY_COLUMNS
        ))
        .bind(doctor_id)
        .bind(date)
        .bind(date)
        .fetch_all(&self.db)
        .await?;

        Ok(candidates
            .iter()
            .filter(|a| a.occurs_on(date))
            .map(Availability::window)
            .collect())
    }

    /// Only the first occurrence date is compared against existing entries.
    async fn check_overlap(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude: Option<i64>,
    ) -> Result<(), AppointmentError> {
        let windows = sqlx::query_as::<_, Availability>(&format!(
            "SELECT {} FROM availabilities
             WHERE doctor_id = ? AND deleted_at IS NULL AND date <= ?
               AND (recurrence_end_date IS NULL OR recurrence_end_date >= ?)",
            AVAILABILITY_COLUMNS
        ))
        .bind(doctor_id)
        .bind(date)
        .bind(date)
        .fetch_all(&self.db)
        .await?;

        let start = minutes_of(start_time);
        let end = minutes_of(end_time);

        let clash = windows.iter().any(|existing| {
            Some(existing.id) != exclude
                && existing.occurs_on(date)
                && ranges_overlap(start, end, minutes_of(existing.start_time), minutes_of(existing.end_time))
        });

        if clash {
            return Err(AppointmentError::AvailabilityOverlap);
        }
        Ok(())
    }
}

fn check_owner(availability: &Availability, owner: Option<i64>) -> Result<(), AppointmentError> {
    match owner {
        Some(doctor_id) if availability.doctor_id != doctor_id => {
            Err(AppointmentError::NotOwner("availability"))
        }
        _ => Ok(()),
    }
}
