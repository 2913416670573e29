use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::middleware::admin_only;

/// Administration, mounted at `/api/admin`. Every route is administrator only.
pub fn admin_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/patients", get(handlers::list_patients).post(handlers::create_patient))
        .route(
            "/patients/{id}",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
        .route("/appointments", get(handlers::list_appointments))
        .route("/appointments/{id}", delete(handlers::delete_appointment))
        .route("/stats", get(handlers::get_stats))
        // Layers run bottom-up: authenticate, then check the role.
        .layer(middleware::from_fn(admin_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
