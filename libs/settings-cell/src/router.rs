use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn settings_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::get_settings).put(handlers::update_settings))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
