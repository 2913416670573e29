use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

/// Patient self-service portal, mounted at `/api/patient`.
pub fn patient_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/appointments", get(list_appointments).post(book_appointment))
        .route("/appointments/{id}", get(get_appointment))
        .route("/appointments/{id}/cancel", post(cancel_appointment))
        .route("/doctors", get(list_doctors))
        .route("/doctors/{id}/slots", get(doctor_slots))
        .route("/notes", get(list_notes))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
