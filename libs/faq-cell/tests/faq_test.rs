use axum::{http::StatusCode, Router};
use serde_json::json;

use faq_cell::{faq_routes, FaqService};
use shared_utils::test_utils::{send_request, TestContext};

async fn app() -> (TestContext, Router) {
    let ctx = TestContext::new().await;
    let app = faq_routes(ctx.state.clone());
    (ctx, app)
}

#[tokio::test]
async fn test_public_list_needs_no_token() {
    let (_, app) = app().await;

    let (status, body) = send_request(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send_request(&app, "GET", "/all", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_manages_entries() {
    let (ctx, app) = app().await;
    let admin = ctx.create_admin("admin@clinique.test").await;
    let token = ctx.token_for(&admin);

    let (status, body) = send_request(
        &app,
        "POST",
        "/",
        Some(&token),
        Some(json!({ "question": "Où stationner ?", "answer": "Derrière la clinique", "is_public": true, "display_order": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["answered_by"], admin.id);

    let (status, body) = send_request(
        &app,
        "POST",
        "/",
        Some(&token),
        Some(json!({ "question": "Horaires ?", "answer": "8h à 17h", "is_public": true, "display_order": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let hours_id = body["id"].as_i64().unwrap();

    let (status, body) = send_request(
        &app,
        "POST",
        "/",
        Some(&token),
        Some(json!({ "question": "Sans réponse", "is_public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "answer");

    let (_, body) = send_request(&app, "GET", "/", None, None).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["question"], "Horaires ?");

    let (status, body) = send_request(
        &app,
        "PUT",
        &format!("/{}", hours_id),
        Some(&token),
        Some(json!({ "is_public": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_public"], false);
    assert_eq!(body["answer"], "8h à 17h");

    let (status, _) = send_request(&app, "DELETE", &format!("/{}", hours_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_request(&app, "DELETE", &format!("/{}", hours_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send_request(&app, "GET", "/all", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_patients_ask_questions() {
    let (ctx, app) = app().await;
    let patient = ctx.create_patient("patient@clinique.test").await;
    let token = ctx.token_for(&patient);

    let (status, body) = send_request(
        &app,
        "POST",
        "/questions",
        Some(&token),
        Some(json!({ "question": "Acceptez-vous les nouveaux patients ?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["question"]["asked_by"], patient.id);
    assert_eq!(body["question"]["is_public"], false);
    let id = body["question"]["id"].as_i64().unwrap();

    let (status, _) = send_request(&app, "GET", "/all", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send_request(&app, "POST", "/", Some(&token), Some(json!({ "question": "x" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let service = FaqService::new(&ctx.state);
    assert_eq!(service.count_unanswered().await.unwrap(), 1);

    // Publishing an unanswered question is refused until it is answered.
    let admin = ctx.create_admin("admin@clinique.test").await;
    let admin_token = ctx.token_for(&admin);
    let uri = format!("/{}", id);
    let (status, _) = send_request(&app, "PUT", &uri, Some(&admin_token), Some(json!({ "is_public": true }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_request(
        &app,
        "PUT",
        &uri,
        Some(&admin_token),
        Some(json!({ "answer": "Oui", "is_public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answered_by"], admin.id);
    assert_eq!(service.count_unanswered().await.unwrap(), 0);
    assert_eq!(service.list_public().await.unwrap().len(), 1);
}
