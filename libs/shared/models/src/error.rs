use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            message: message.to_string(),
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Validation { message, errors } => {
                tracing::debug!("Validation failed: {} ({} field errors)", message, errors.len());
                json!({
                    "error": message,
                    "errors": errors
                })
            }
            AppError::Database(msg) | AppError::Internal(msg) => {
                tracing::error!("Error: {}: {}", status, msg);
                json!({
                    "error": "Internal server error"
                })
            }
            AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg) => {
                tracing::debug!("Error: {}: {}", status, msg);
                json!({
                    "error": msg
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Column name from an SQLite constraint message such as
/// `UNIQUE constraint failed: users.email`.
fn constraint_field(message: &str) -> Option<String> {
    let columns = message.split(": ").nth(1)?;
    let first = columns.split(',').next()?.trim();
    first.rsplit('.').next().map(|field| field.to_string())
}

/// Leading column of a CHECK expression, e.g. `duration_minutes` in
/// "CHECK constraint failed: duration_minutes > 0".
fn check_field(message: &str) -> Option<String> {
    let expression = message.split(": ").nth(1)?.trim_start_matches(|c: char| c == '(' || c.is_whitespace());
    let field: String = expression
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!field.is_empty()).then_some(field)
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let field = constraint_field(db_err.message()).unwrap_or_else(|| "id".to_string());
                    let message = format!("A record with this {} already exists", field);
                    AppError::Validation {
                        errors: vec![FieldError::new(field, message.clone())],
                        message,
                    }
                } else if db_err.is_foreign_key_violation() {
                    // SQLite does not say which column failed.
                    AppError::validation("reference", "Referenced record does not exist")
                } else if db_err.is_check_violation() {
                    let field = check_field(db_err.message()).unwrap_or_else(|| "value".to_string());
                    let message = format!("Invalid value for {}", field);
                    AppError::Validation {
                        errors: vec![FieldError::new(field, message.clone())],
                        message,
                    }
                } else {
                    AppError::Database(db_err.to_string())
                }
            }
            other => AppError::Database(other.to_string()),
        }
    }
}
