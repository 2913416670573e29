use axum::{body::Body, http::Request, middleware::Next, response::Response};

use shared_models::error::AppError;
use shared_models::Role;
use shared_utils::extractor::extract_user;

/// Must run after `auth_middleware` has attached the caller.
pub async fn admin_only(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = extract_user(&request)?;
    user.require_role(Role::Administrator)?;
    Ok(next.run(request).await)
}
