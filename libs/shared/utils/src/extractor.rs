use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use sqlx::SqlitePool;
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;

use crate::jwt::validate_token;

pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Err(AppError::Auth("Missing authorization header".to_string()));
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Reloads the token's account so deletions, deactivations and role changes
/// take effect before the token expires.
pub async fn current_user(db: &SqlitePool, claims: AuthUser) -> Result<AuthUser, AppError> {
    let row: Option<(String, Role, bool)> = sqlx::query_as(
        "SELECT email, role, is_active FROM users WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(claims.id)
    .fetch_optional(db)
    .await?;

    let Some((email, role, is_active)) = row else {
        debug!("Token refers to missing user {}", claims.id);
        return Err(AppError::Auth("Account no longer exists".to_string()));
    };
    if !is_active {
        return Err(AppError::Forbidden("This account has been deactivated".to_string()));
    }

    Ok(AuthUser {
        id: claims.id,
        email,
        role,
    })
}

// Validates the bearer token and stores the caller as an `AuthUser` extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let claims = validate_token(&token, &state.config.jwt_secret)?;
    let user = current_user(&state.db, claims).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<AuthUser, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_present() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing() {
        assert_matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Auth(msg)) if msg == "Missing authorization header"
        );
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_matches!(
            bearer_token(&headers),
            Err(AppError::Auth(msg)) if msg == "Invalid authorization header format"
        );
    }
}
