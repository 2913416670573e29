use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use appointment_cell::models::AppointmentQuery;
use appointment_cell::AppointmentService;
use auth_cell::models::{CreateUserRequest, UpdateUserRequest, UserQuery};
use auth_cell::UserService;
use patient_cell::models::{ClientQuery, CreateClientRequest, UpdateClientRequest};
use patient_cell::ClientService;
use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::pagination::Pagination;

use crate::service::DashboardService;

// ==============================================================================
// USERS
// ==============================================================================

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let page = UserService::new(&state)
        .list(query.role, query.search.as_deref(), Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(json!(page)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let user = UserService::new(&state).get(user_id).await?;
    Ok(Json(json!(user)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let input = request.validate()?;
    let user = UserService::new(&state).create(input).await?;

    info!("User {} ({}) created by admin {}", user.id, user.role, admin.id);
    Ok((StatusCode::CREATED, Json(json!(user))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = request.validate()?;
    let user = UserService::new(&state).update(user_id, changes).await?;
    Ok(Json(json!(user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    UserService::new(&state).soft_delete(user_id, admin.id).await?;

    info!("User {} deleted by admin {}", user_id, admin.id);
    Ok(Json(json!({ "message": "User deleted" })))
}

// ==============================================================================
// PATIENTS
// ==============================================================================

pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Value>, AppError> {
    let page = ClientService::new(&state)
        .search(query.search.as_deref(), Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(json!(page)))
}

pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let client = ClientService::new(&state).get(client_id).await?;
    Ok(Json(json!(client)))
}

pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let input = request.validate()?;
    let client = ClientService::new(&state).create(&input).await?;
    Ok((StatusCode::CREATED, Json(json!(client))))
}

pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = request.validate()?;
    let client = ClientService::new(&state).update(client_id, changes).await?;
    Ok(Json(json!(client)))
}

pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    ClientService::new(&state).soft_delete(client_id).await?;
    Ok(Json(json!({ "message": "Patient deleted" })))
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    let filters = query.filters()?;
    let page = AppointmentService::new(&state)
        .list(&filters, Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(json!(page)))
}

pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    AppointmentService::new(&state).soft_delete(appointment_id).await?;
    Ok(Json(json!({ "message": "Appointment deleted" })))
}

// ==============================================================================
// STATISTICS
// ==============================================================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let stats = DashboardService::new(&state).stats().await?;
    Ok(Json(json!(stats)))
}
