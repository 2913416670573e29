use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use appointment_cell::models::{
    AppointmentQuery, AvailabilityQuery, BookAppointmentRequest, CreateAvailabilityRequest,
    UpdateAppointmentRequest, UpdateAvailabilityRequest, UpdateStatusRequest,
};
use appointment_cell::{AppointmentError, AppointmentService, AvailabilityService, BookingChannel};
use patient_cell::models::{CreateMedicalNoteRequest, UpdateMedicalNoteRequest};
use patient_cell::{ClientService, MedicalNoteService};
use settings_cell::SettingsService;
use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::Permission;
use shared_utils::pagination::Pagination;
use shared_utils::validation::FieldErrors;

use crate::models::{doctor_scope, PatientListQuery};

// ==============================================================================
// AVAILABILITY
// ==============================================================================

pub async fn list_availabilities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageAvailability)?;

    let mut errors = FieldErrors::new();
    let from = query.from.as_deref().and_then(|d| errors.date(d, "from"));
    let to = query.to.as_deref().and_then(|d| errors.date(d, "to"));
    errors.into_result()?;

    let doctor_id = doctor_scope(&user).or(query.doctor_id);
    let availabilities = AvailabilityService::new(&state)
        .list(doctor_id, from, to)
        .await?;

    Ok(Json(json!(availabilities)))
}

pub async fn create_availability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    user.require(Permission::ManageAvailability)?;

    let doctor_id = doctor_scope(&user)
        .or(request.doctor_id)
        .ok_or_else(|| AppError::validation("doctor_id", "doctor_id is required"))?;
    let input = request.validate()?;

    let availability = AvailabilityService::new(&state).create(doctor_id, input).await?;
    Ok((StatusCode::CREATED, Json(json!(availability))))
}

pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(availability_id): Path<i64>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageAvailability)?;
    let changes = request.validate()?;

    let availability = AvailabilityService::new(&state)
        .update(availability_id, changes, doctor_scope(&user))
        .await?;
    Ok(Json(json!(availability)))
}

pub async fn delete_availability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(availability_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageAvailability)?;

    AvailabilityService::new(&state)
        .delete(availability_id, doctor_scope(&user))
        .await?;
    Ok(Json(json!({ "message": "Availability deleted" })))
}

// ==============================================================================
// SCHEDULE
// ==============================================================================

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageAppointments)?;

    let mut filters = query.filters()?;
    if let Some(doctor_id) = doctor_scope(&user) {
        filters.doctor_id = Some(doctor_id);
    }

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
    user.require(Permission::ManageAppointments)?;
    let default_duration = SettingsService::new(&state).appointment_duration(user.id).await?;
    let input = request.validate(None, doctor_scope(&user), default_duration)?;

    debug!("Staff booking by user {} for patient {}", user.id, input.client_id);

    let service = AppointmentService::new(&state);
    let appointment = service.book(input, BookingChannel::Staff, Some(user.id)).await?;
    let view = service.get_view(appointment.id).await?;

    Ok((StatusCode::CREATED, Json(json!(view))))
}

pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageAppointments)?;

    let view = AppointmentService::new(&state).get_view(appointment_id).await?;
    if let Some(doctor_id) = doctor_scope(&user) {
        if view.appointment.doctor_id != doctor_id {
            return Err(AppointmentError::NotOwner("appointment").into());
        }
    }

    Ok(Json(json!(view)))
}

pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageAppointments)?;
    let changes = request.validate()?;

    let appointment = AppointmentService::new(&state)
        .update(appointment_id, changes, doctor_scope(&user))
        .await?;
    Ok(Json(json!(appointment)))
}

pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageAppointments)?;

    let appointment = AppointmentService::new(&state)
        .change_status(appointment_id, request.status, doctor_scope(&user))
        .await?;
    Ok(Json(json!(appointment)))
}

// ==============================================================================
// PATIENT RECORDS AND NOTES
// ==============================================================================

pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ViewPatients)?;
    let service = ClientService::new(&state);

    if let (Some(true), Some(doctor_id)) = (query.mine, doctor_scope(&user)) {
        let clients = service.list_for_doctor(doctor_id).await?;
        return Ok(Json(json!({
            "items": clients,
            "total": clients.len()
        })));
    }

    let page = service
        .search(query.search.as_deref(), Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(json!(page)))
}

pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ViewPatients)?;

    let client = ClientService::new(&state).get(client_id).await?;
    Ok(Json(json!(client)))
}

pub async fn list_patient_notes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ReadMedicalNotes)?;

    ClientService::new(&state).get(client_id).await?;
    let notes = MedicalNoteService::new(&state)
        .list_for_client(client_id, true)
        .await?;
    Ok(Json(json!(notes)))
}

pub async fn create_patient_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<i64>,
    Json(request): Json<CreateMedicalNoteRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    user.require(Permission::WriteMedicalNotes)?;
    let input = request.validate()?;

    let note = MedicalNoteService::new(&state)
        .create(client_id, user.id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(json!(note))))
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(note_id): Path<i64>,
    Json(request): Json<UpdateMedicalNoteRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::WriteMedicalNotes)?;
    let changes = request.validate()?;

    let note = MedicalNoteService::new(&state)
        .update(note_id, changes, Some(user.id))
        .await?;
    Ok(Json(json!(note)))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(note_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::WriteMedicalNotes)?;

    MedicalNoteService::new(&state)
        .delete(note_id, Some(user.id))
        .await?;
    Ok(Json(json!({ "message": "Note deleted" })))
}
