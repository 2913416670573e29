use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use serde_json::Value;
use tower::ServiceExt;

use shared_config::AppConfig;
use shared_database::{connect, run_migrations, AppState};
use shared_models::auth::{JwtClaims, Role};

use crate::jwt::create_token;
use crate::password::hash_password;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";
pub const TEST_PASSWORD: &str = "Password123";

// Argon2 is slow in debug builds; hash the shared test password once.
static TEST_PASSWORD_HASH: Lazy<String> =
    Lazy::new(|| hash_password(TEST_PASSWORD).expect("test password hashes"));

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration_hours: 24,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cors_allowed_origin: None,
        admin_email: None,
        admin_password: None,
    }
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    /// Linked client record, only for patients.
    pub client_id: Option<i64>,
}

impl TestUser {
    pub fn client_id(&self) -> i64 {
        self.client_id.expect("test user is a patient with a client record")
    }
}

/// Fresh in-memory database with the schema applied.
pub struct TestContext {
    pub state: Arc<AppState>,
}

impl TestContext {
    pub async fn new() -> Self {
        let config = test_config();
        let db = connect(&config.database_url).await.expect("in-memory database");
        run_migrations(&db).await.expect("migrations apply");

        Self {
            state: Arc::new(AppState::new(config, db)),
        }
    }

    pub fn db(&self) -> &sqlx::SqlitePool {
        &self.state.db
    }

    pub async fn create_user(&self, email: &str, role: Role) -> TestUser {
        let now = Utc::now();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone, role, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?) RETURNING id",
        )
        .bind(email)
        .bind(TEST_PASSWORD_HASH.as_str())
        .bind("Test")
        .bind("User")
        .bind("514-555-0100")
        .bind(role)
        .bind(now)
        .bind(now)
        .fetch_one(self.db())
        .await
        .expect("user inserts");

        TestUser {
            id,
            email: email.to_string(),
            role,
            client_id: None,
        }
    }

    pub async fn create_admin(&self, email: &str) -> TestUser {
        self.create_user(email, Role::Administrator).await
    }

    pub async fn create_doctor(&self, email: &str) -> TestUser {
        self.create_user(email, Role::Doctor).await
    }

    /// Patient login plus its linked client record.
    pub async fn create_patient(&self, email: &str) -> TestUser {
        let mut user = self.create_user(email, Role::Patient).await;
        let client_id = self.create_client(email, Some(user.id)).await;
        user.client_id = Some(client_id);
        user
    }

    pub async fn create_client(&self, email: &str, user_id: Option<i64>) -> i64 {
        let now = Utc::now();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO clients (user_id, first_name, last_name, email, phone, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(user_id)
        .bind("Test")
        .bind("Client")
        .bind(email)
        .bind("514-555-0101")
        .bind(now)
        .bind(now)
        .fetch_one(self.db())
        .await
        .expect("client inserts");
        id
    }

    pub fn token_for(&self, user: &TestUser) -> String {
        create_token(
            user.id,
            &user.email,
            user.role,
            &self.state.config.jwt_secret,
            self.state.config.jwt_expiration_hours,
        )
        .expect("token signs")
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: i64) -> String {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(exp_hours)).timestamp(),
        };

        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("token encodes")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, -2)
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", 24)
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Sends one request through `app` and returns the status with the JSON body
/// (`Value::Null` when the body is empty).
pub async fn send_request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = test_config();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.is_configured());
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser {
            id: 7,
            email: "test@example.com".to_string(),
            role: Role::Patient,
            client_id: None,
        };
        let token = JwtTestUtils::create_test_token(&user, TEST_JWT_SECRET, 1);
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(validate_token(&token, TEST_JWT_SECRET).unwrap().id, 7);
        assert!(validate_token(&JwtTestUtils::create_invalid_signature_token(&user), TEST_JWT_SECRET).is_err());
    }

    #[tokio::test]
    async fn test_context_seeds_patient_with_client() {
        let ctx = TestContext::new().await;
        let patient = ctx.create_patient("patient@example.com").await;

        let (linked,): (Option<i64>,) = sqlx::query_as("SELECT user_id FROM clients WHERE id = ?")
            .bind(patient.client_id())
            .fetch_one(ctx.db())
            .await
            .unwrap();
        assert_eq!(linked, Some(patient.id));
    }
}
