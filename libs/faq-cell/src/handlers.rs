use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::Permission;

use crate::models::{AskQuestionRequest, CreateFaqRequest, UpdateFaqRequest};
use crate::service::FaqService;

pub async fn list_public_faqs(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let faqs = FaqService::new(&state).list_public().await?;
    Ok(Json(json!(faqs)))
}

pub async fn list_all_faqs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageFaq)?;

    let faqs = FaqService::new(&state).list_all().await?;
    Ok(Json(json!(faqs)))
}

pub async fn create_faq(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateFaqRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    user.require(Permission::ManageFaq)?;
    let request = request.validate()?;

    let faq = FaqService::new(&state).create(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(json!(faq))))
}

pub async fn update_faq(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(faq_id): Path<i64>,
    Json(request): Json<UpdateFaqRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageFaq)?;
    let changes = request.validate()?;

    let faq = FaqService::new(&state).update(faq_id, changes, user.id).await?;
    Ok(Json(json!(faq)))
}

pub async fn delete_faq(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(faq_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(Permission::ManageFaq)?;

    FaqService::new(&state).delete(faq_id).await?;
    Ok(Json(json!({ "message": "FAQ deleted" })))
}

pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AskQuestionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    user.require(Permission::AskQuestion)?;
    let question = request.validate()?;

    let faq = FaqService::new(&state).ask(&question, user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Question submitted",
            "question": faq
        })),
    ))
}
