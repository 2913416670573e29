use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::Permission;

use crate::models::UpdateSettingsRequest;
use crate::service::SettingsService;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageOwnSettings)?;

    let settings = SettingsService::new(&state).get_or_create(user.id).await?;
    Ok(Json(json!(settings)))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageOwnSettings)?;
    let changes = request.validate()?;

    let settings = SettingsService::new(&state).update(user.id, changes).await?;
    Ok(Json(json!(settings)))
}
