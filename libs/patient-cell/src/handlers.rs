use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use appointment_cell::models::{AppointmentQuery, BookAppointmentRequest, Period, SlotQuery};
use appointment_cell::{AppointmentService, BookingChannel, DoctorDirectory};
use settings_cell::SettingsService;
use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::Permission;
use shared_utils::pagination::Pagination;
use shared_utils::validation::FieldErrors;

use crate::models::{Client, PatientProfile, UpdateClientRequest, UpdateProfileRequest};
use crate::services::{ClientService, MedicalNoteService};

async fn own_record(state: &AppState, user: &AuthUser, permission: Permission) -> Result<Client, AppError> {
    user.require(permission)?;
    Ok(ClientService::new(state).get_by_user(user.id).await?)
}

// ==============================================================================
// PROFILE
// ==============================================================================

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let client = own_record(&state, &user, Permission::ViewOwnRecords).await?;
    Ok(Json(json!(PatientProfile::from(client))))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let client = own_record(&state, &user, Permission::ViewOwnRecords).await?;
    let changes = UpdateClientRequest::from(request).validate()?;

    let updated = ClientService::new(&state).update(client.id, changes).await?;
    Ok(Json(json!(PatientProfile::from(updated))))
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    let client = own_record(&state, &user, Permission::ViewOwnRecords).await?;

    let mut filters = query.filters()?;
    filters.client_id = Some(client.id);

    let page = AppointmentService::new(&state)
        .list(&filters, Pagination::new(query.page, query.limit))
        .await?;

    Ok(Json(json!(page)))
}

pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let client = own_record(&state, &user, Permission::BookAppointment).await?;
    let default_duration = SettingsService::new(&state).appointment_duration(user.id).await?;
    let input = request.validate(Some(client.id), None, default_duration)?;

    let service = AppointmentService::new(&state);
    let appointment = service
        .book(input, BookingChannel::Patient, Some(user.id))
        .await?;
    let view = service.get_view(appointment.id).await?;

    Ok((StatusCode::CREATED, Json(json!(view))))
}

pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let client = own_record(&state, &user, Permission::ViewOwnRecords).await?;

    let view = AppointmentService::new(&state).get_view(appointment_id).await?;
    if view.appointment.client_id != client.id {
        return Err(AppError::NotFound("Appointment not found".to_string()));
    }

    Ok(Json(json!(view)))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let client = own_record(&state, &user, Permission::BookAppointment).await?;

    let appointment = AppointmentService::new(&state)
        .cancel_for_client(appointment_id, client.id)
        .await?;

    Ok(Json(json!({
        "message": "Appointment cancelled",
        "appointment": appointment
    })))
}

// ==============================================================================
// DOCTORS AND SLOTS
// ==============================================================================

pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ViewAvailability)?;

    let doctors = DoctorDirectory::new(&state).list_active_doctors().await?;
    Ok(Json(json!(doctors)))
}

pub async fn doctor_slots(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ViewAvailability)?;

    let mut errors = FieldErrors::new();
    let date = errors.date(&query.date, "date");
    let duration = match query.duration {
        Some(duration) => duration,
        None => SettingsService::new(&state).appointment_duration(user.id).await?,
    };
    errors.duration(duration, "duration");
    let period = match query.period.as_deref() {
        Some(raw) => {
            let parsed = raw.parse::<Period>().ok();
            errors.check(parsed.is_some(), "period", "Period must be morning, afternoon or evening");
            parsed
        }
        None => None,
    };
    errors.into_result()?;

    let date = date.ok_or_else(|| AppError::validation("date", "Invalid date, expected YYYY-MM-DD"))?;
    let slots = AppointmentService::new(&state)
        .available_slots(doctor_id, date, duration, period)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": date,
        "duration": duration,
        "slots": slots
    })))
}

// ==============================================================================
// NOTES
// ==============================================================================

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let client = own_record(&state, &user, Permission::ViewOwnRecords).await?;

    let notes = MedicalNoteService::new(&state)
        .list_visible_to_patient(client.id)
        .await?;
    Ok(Json(json!(notes)))
}
