use std::sync::Arc;

use axum::{routing::get, Router};

use admin_cell::admin_routes;
use auth_cell::auth_routes;
use doctor_cell::doctor_routes;
use faq_cell::faq_routes;
use patient_cell::patient_routes;
use settings_cell::settings_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "MRMS API is running!" }))
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/patient", patient_routes(state.clone()))
        .nest("/api/medecin", doctor_routes(state.clone()))
        .nest("/api/admin", admin_routes(state.clone()))
        .nest("/api/faq", faq_routes(state.clone()))
        .nest("/api/parametres", settings_routes(state))
}
