use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use patient_cell::models::PatientProfile;
use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::permissions::permissions_for;
use shared_utils::extractor::bearer_token;

use crate::models::{ChangePasswordRequest, LoginRequest, RegisterRequest, VerifyRequest};
use crate::services::{AuthService, UserService};

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AuthService::new(&state);
    let (token, user) = service.login(&request.email, &request.password).await?;

    Ok(Json(json!({
        "token": token,
        "token_type": "Bearer",
        "expires_in": service.token_lifetime_seconds(),
        "user": user
    })))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let registration = request.validate()?;

    let service = AuthService::new(&state);
    let (token, user, client) = service.register(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "token_type": "Bearer",
            "expires_in": service.token_lifetime_seconds(),
            "user": user,
            "patient": PatientProfile::from(client)
        })),
    ))
}

// Accepts the token either as a bearer header or as `{"token": "..."}`.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    debug!("Verifying token");

    let token = bearer_token(&headers).ok().or_else(|| {
        serde_json::from_slice::<VerifyRequest>(&body)
            .ok()
            .and_then(|request| request.token)
    });

    let verified = match token {
        Some(token) => AuthService::new(&state).verify(&token).await,
        None => None,
    };

    match verified {
        Some(user) => Json(json!({
            "valid": true,
            "user_id": user.id,
            "email": user.email,
            "role": user.role
        })),
        None => Json(json!({ "valid": false })),
    }
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let account = UserService::new(&state).get(user.id).await?;
    let permissions: Vec<&str> = permissions_for(account.role).iter().map(|p| p.as_str()).collect();

    Ok(Json(json!({
        "user": account,
        "permissions": permissions
    })))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    request.validate()?;

    AuthService::new(&state).change_password(user.id, &request).await?;

    Ok(Json(json!({ "message": "Password updated" })))
}
