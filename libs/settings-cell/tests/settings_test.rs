use axum::http::StatusCode;
use serde_json::json;

use settings_cell::{settings_routes, SettingsService};
use shared_models::Language;
use shared_utils::test_utils::{send_request, TestContext};

#[tokio::test]
async fn test_defaults_are_created_on_first_read() {
    let ctx = TestContext::new().await;
    let app = settings_routes(ctx.state.clone());
    let doctor = ctx.create_doctor("doctor@clinique.test").await;

    let (status, body) = send_request(&app, "GET", "/", Some(&ctx.token_for(&doctor)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], doctor.id);
    assert_eq!(body["email_notifications"], true);
    assert_eq!(body["sms_notifications"], false);
    assert_eq!(body["reminder_hours_before"], 24);
    assert_eq!(body["default_appointment_duration"], 30);
    assert_eq!(body["language"], "fr");

    // A second read reuses the same row.
    let again = SettingsService::new(&ctx.state).get_or_create(doctor.id).await.unwrap();
    assert_eq!(again.id, body["id"].as_i64().unwrap());
}

#[tokio::test]
async fn test_update_validates_and_persists() {
    let ctx = TestContext::new().await;
    let app = settings_routes(ctx.state.clone());
    let patient = ctx.create_patient("patient@clinique.test").await;
    let token = ctx.token_for(&patient);

    let (status, body) = send_request(
        &app,
        "PUT",
        "/",
        Some(&token),
        Some(json!({ "reminder_hours_before": 0, "language": "de" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let (status, body) = send_request(
        &app,
        "PUT",
        "/",
        Some(&token),
        Some(json!({ "sms_notifications": true, "reminder_hours_before": 48, "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sms_notifications"], true);
    assert_eq!(body["email_notifications"], true);
    assert_eq!(body["reminder_hours_before"], 48);

    let stored = SettingsService::new(&ctx.state).get_or_create(patient.id).await.unwrap();
    assert_eq!(stored.language, Language::En);
}

#[tokio::test]
async fn test_requires_authentication() {
    let ctx = TestContext::new().await;
    let app = settings_routes(ctx.state.clone());

    let (status, _) = send_request(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
