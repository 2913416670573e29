use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Mounted at `/api/faq`. Only the published list is public.
pub fn faq_routes(state: Arc<AppState>) -> Router {
    let public_routes = Router::new().route("/", get(handlers::list_public_faqs));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_faq))
        .route("/all", get(handlers::list_all_faqs))
        .route("/questions", post(handlers::ask_question))
        .route("/{id}", put(handlers::update_faq).delete(handlers::delete_faq))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
