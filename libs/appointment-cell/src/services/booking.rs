// libs/appointment-cell/src/services/booking.rs
use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use shared_database::AppState;
use shared_utils::pagination::{Paginated, Pagination};

use crate::models::{
    minutes_of, ranges_overlap, Appointment, AppointmentChanges, AppointmentError, AppointmentFilters,
    AppointmentStatus, AppointmentView, NewAppointment, Period, TimeSlot,
};
use crate::services::availability::AvailabilityService;
use crate::services::doctors::DoctorDirectory;
use crate::services::slots::{filter_by_period, fits_in_windows, generate_slots};

const APPOINTMENT_COLUMNS: &str = "a.id, a.client_id, a.doctor_id, a.date, a.time, a.duration_minutes, \
     a.status, a.reason, a.notes, a.notify_email, a.notify_sms, a.reminder_sent, a.created_by, \
     a.created_at, a.updated_at";

const VIEW_FROM: &str = " FROM appointments a
     JOIN clients c ON c.id = a.client_id
     JOIN users u ON u.id = a.doctor_id
     WHERE a.deleted_at IS NULL";

/// Who is booking decides whether the doctor's published availability binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingChannel {
    /// Self-service booking: must fit inside an availability window.
    Patient,
    /// Doctor or administrator booking on a patient's behalf.
    Staff,
}

pub struct AppointmentService {
    db: SqlitePool,
    doctors: DoctorDirectory,
    availability: AvailabilityService,
}

impl AppointmentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            doctors: DoctorDirectory::new(state),
            availability: AvailabilityService::new(state),
        }
    }

    pub async fn book(
        &self,
        input: NewAppointment,
        channel: BookingChannel,
        created_by: Option<i64>,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking appointment for client {} with doctor {} at {} {}",
            input.client_id, input.doctor_id, input.date, input.time
        );

        self.doctors.get_active_doctor(input.doctor_id).await?;

        let contact_preference: String = sqlx::query_scalar(
            "SELECT contact_preference FROM clients WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(input.client_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppointmentError::ClientNotFound)?;

        if input.date.and_time(input.time) <= Local::now().naive_local() {
            return Err(AppointmentError::InPast);
        }

        if channel == BookingChannel::Patient {
            let windows = self.availability.windows_on(input.doctor_id, input.date).await?;
            if !fits_in_windows(&windows, input.time, input.duration_minutes) {
                return Err(AppointmentError::OutsideAvailability);
            }
        }

        let notify_email = input.notify_email.unwrap_or(contact_preference != "sms");
        let notify_sms = input.notify_sms.unwrap_or(contact_preference == "sms");

        let mut tx = self.db.begin().await?;

        ensure_slot_free(
            &mut tx,
            input.doctor_id,
            input.date,
            input.time,
            input.duration_minutes,
            None,
        )
        .await?;

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO appointments (client_id, doctor_id, date, time, duration_minutes, status, reason, notes,
                                       notify_email, notify_sms, reminder_sent, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?) RETURNING id",
        )
        .bind(input.client_id)
        .bind(input.doctor_id)
        .bind(input.date)
        .bind(input.time)
        .bind(input.duration_minutes)
        .bind(AppointmentStatus::Scheduled)
        .bind(&input.reason)
        .bind(&input.notes)
        .bind(notify_email)
        .bind(notify_sms)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Appointment {} booked with doctor {}", id, input.doctor_id);
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Appointment, AppointmentError> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments a WHERE a.id = ? AND a.deleted_at IS NULL",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppointmentError::NotFound)
    }

    pub async fn get_view(&self, id: i64) -> Result<AppointmentView, AppointmentError> {
        sqlx::query_as::<_, AppointmentView>(&format!(
            "SELECT {}, {}{} AND a.id = ?",
            APPOINTMENT_COLUMNS,
            name_columns(),
            VIEW_FROM
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppointmentError::NotFound)
    }

    pub async fn list(
        &self,
        filters: &AppointmentFilters,
        pagination: Pagination,
    ) -> Result<Paginated<AppointmentView>, AppointmentError> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        count_query.push(VIEW_FROM);
        push_filters(&mut count_query, filters);
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {}, {}",
            APPOINTMENT_COLUMNS,
            name_columns()
        ));
        query.push(VIEW_FROM);
        push_filters(&mut query, filters);
        query.push(" ORDER BY a.date, a.time, a.id LIMIT ");
        query.push_bind(pagination.limit());
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let items = query
            .build_query_as::<AppointmentView>()
            .fetch_all(&self.db)
            .await?;

        debug!("Listed {} of {} appointments", items.len(), total);
        Ok(Paginated::new(items, total, pagination))
    }

    /// `owner` restricts the change to that doctor's own appointments.
    pub async fn update(
        &self,
        id: i64,
        changes: AppointmentChanges,
        owner: Option<i64>,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get(id).await?;
        check_owner(&current, owner)?;

        if current.status.is_terminal() {
            return Err(AppointmentError::NotModifiable(current.status));
        }

        let date = changes.date.unwrap_or(current.date);
        let time = changes.time.unwrap_or(current.time);
        let duration = changes.duration_minutes.unwrap_or(current.duration_minutes);

        if changes.moves_slot() && date.and_time(time) <= Local::now().naive_local() {
            return Err(AppointmentError::InPast);
        }

        let mut tx = self.db.begin().await?;

        if changes.moves_slot() {
            ensure_slot_free(&mut tx, current.doctor_id, date, time, duration, Some(id)).await?;
        }

        sqlx::query(
            "UPDATE appointments
             SET date = ?, time = ?, duration_minutes = ?, reason = ?, notes = ?,
                 notify_email = ?, notify_sms = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(date)
        .bind(time)
        .bind(duration)
        .bind(changes.reason.or(current.reason))
        .bind(changes.notes.or(current.notes))
        .bind(changes.notify_email.unwrap_or(current.notify_email))
        .bind(changes.notify_sms.unwrap_or(current.notify_sms))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Appointment {} updated", id);
        self.get(id).await
    }

    pub async fn change_status(
        &self,
        id: i64,
        status: AppointmentStatus,
        owner: Option<i64>,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get(id).await?;
        check_owner(&current, owner)?;

        if !current.status.can_transition_to(status) {
            warn!("Rejected transition {} -> {} for appointment {}", current.status, status, id);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current.status,
                to: status,
            });
        }

        sqlx::query("UPDATE appointments SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        info!("Appointment {} is now {}", id, status);
        self.get(id).await
    }

    /// Cancels an appointment that must belong to `client_id`; anything else
    /// reads as not found.
    pub async fn cancel_for_client(&self, id: i64, client_id: i64) -> Result<Appointment, AppointmentError> {
        let current = self.get(id).await?;
        if current.client_id != client_id {
            return Err(AppointmentError::NotFound);
        }
        self.change_status(id, AppointmentStatus::Cancelled, None).await
    }

    pub async fn soft_delete(&self, id: i64) -> Result<(), AppointmentError> {
        let result = sqlx::query(
            "UPDATE appointments SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} deleted", id);
        Ok(())
    }

    pub async fn available_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        duration: i64,
        period: Option<Period>,
    ) -> Result<Vec<TimeSlot>, AppointmentError> {
        self.doctors.get_active_doctor(doctor_id).await?;

        let now = Local::now().naive_local();
        if date < now.date() {
            return Ok(Vec::new());
        }
        let not_before = (date == now.date()).then(|| now.time());

        let windows = self.availability.windows_on(doctor_id, date).await?;
        let booked = booked_ranges(&self.db, doctor_id, date, None).await?;

        let slots = generate_slots(&windows, &booked, duration, not_before);
        Ok(filter_by_period(slots, period))
    }

    /// Live appointment counts keyed by status; every status is present.
    pub async fn counts_by_status(&self) -> Result<BTreeMap<String, i64>, AppointmentError> {
        let rows: Vec<(AppointmentStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM appointments WHERE deleted_at IS NULL GROUP BY status",
        )
        .fetch_all(&self.db)
        .await?;

        let mut counts: BTreeMap<String, i64> = AppointmentStatus::ALL
            .iter()
            .map(|status| (status.as_str().to_string(), 0))
            .collect();
        for (status, count) in rows {
            counts.insert(status.as_str().to_string(), count);
        }
        Ok(counts)
    }

    pub async fn count_on(&self, date: NaiveDate) -> Result<i64, AppointmentError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments WHERE deleted_at IS NULL AND date = ?",
        )
        .bind(date)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    pub async fn count_upcoming(&self) -> Result<i64, AppointmentError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments
             WHERE deleted_at IS NULL AND status IN ('scheduled', 'confirmed') AND date >= ?",
        )
        .bind(Local::now().date_naive())
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }
}

fn name_columns() -> &'static str {
    "c.first_name || ' ' || c.last_name AS client_name, u.first_name || ' ' || u.last_name AS doctor_name"
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filters: &AppointmentFilters) {
    if let Some(client_id) = filters.client_id {
        query.push(" AND a.client_id = ").push_bind(client_id);
    }
    if let Some(doctor_id) = filters.doctor_id {
        query.push(" AND a.doctor_id = ").push_bind(doctor_id);
    }
    if let Some(status) = filters.status {
        query.push(" AND a.status = ").push_bind(status);
    }
    if let Some(from) = filters.date_from {
        query.push(" AND a.date >= ").push_bind(from);
    }
    if let Some(to) = filters.date_to {
        query.push(" AND a.date <= ").push_bind(to);
    }
}

fn check_owner(appointment: &Appointment, owner: Option<i64>) -> Result<(), AppointmentError> {
    match owner {
        Some(doctor_id) if appointment.doctor_id != doctor_id => Err(AppointmentError::NotOwner("appointment")),
        _ => Ok(()),
    }
}

/// Minute ranges taken by live, non-cancelled appointments of `doctor_id` on
/// `date`. Completed and no-show visits keep their slot.
async fn booked_ranges<'e, E>(
    executor: E,
    doctor_id: i64,
    date: NaiveDate,
    exclude: Option<i64>,
) -> Result<Vec<(i64, i64)>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(NaiveTime, i64)> = sqlx::query_as(
        "SELECT time, duration_minutes FROM appointments
         WHERE doctor_id = ? AND date = ? AND deleted_at IS NULL
           AND status != 'cancelled'
           AND (? IS NULL OR id != ?)",
    )
    .bind(doctor_id)
    .bind(date)
    .bind(exclude)
    .bind(exclude)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(time, duration)| {
            let start = minutes_of(time);
            (start, start + duration)
        })
        .collect())
}

async fn ensure_slot_free(
    conn: &mut SqliteConnection,
    doctor_id: i64,
    date: NaiveDate,
    time: NaiveTime,
    duration: i64,
    exclude: Option<i64>,
) -> Result<(), AppointmentError> {
    let start = minutes_of(time);
    let end = start + duration;

    let taken = booked_ranges(&mut *conn, doctor_id, date, exclude)
        .await?
        .into_iter()
        .any(|(b_start, b_end)| ranges_overlap(start, end, b_start, b_end));

    if taken {
        return Err(AppointmentError::SlotTaken);
    }
    Ok(())
}
