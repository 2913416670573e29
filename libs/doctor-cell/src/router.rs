use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Doctor portal, mounted at `/api/medecin`.
pub fn doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/availabilities",
            get(handlers::list_availabilities).post(handlers::create_availability),
        )
        .route(
            "/availabilities/{id}",
            put(handlers::update_availability).delete(handlers::delete_availability),
        )
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        .route(
            "/appointments/{id}",
            get(handlers::get_appointment).put(handlers::update_appointment),
        )
        .route("/appointments/{id}/status", put(handlers::update_appointment_status))
        .route("/patients", get(handlers::list_patients))
        .route("/patients/{id}", get(handlers::get_patient))
        .route(
            "/patients/{id}/notes",
            get(handlers::list_patient_notes).post(handlers::create_patient_note),
        )
        .route("/notes/{id}", put(handlers::update_note).delete(handlers::delete_note))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
