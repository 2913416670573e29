use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use shared_utils::validation::FieldErrors;

pub const MAX_QUESTION_LENGTH: usize = 1000;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub is_public: bool,
    pub display_order: i64,
    pub asked_by: Option<i64>,
    pub answered_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn has_answer(answer: Option<&str>) -> bool {
    answer.map(|a| !a.trim().is_empty()).unwrap_or(false)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFaqRequest {
    pub question: String,
    pub answer: Option<String>,
    pub is_public: Option<bool>,
    pub display_order: Option<i64>,
}

impl CreateFaqRequest {
    pub fn validate(self) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        errors.required(&self.question, "question");
        errors.check(
            self.question.chars().count() <= MAX_QUESTION_LENGTH,
            "question",
            "Question is too long",
        );
        if self.is_public.unwrap_or(false) {
            errors.check(
                has_answer(self.answer.as_deref()),
                "answer",
                "A public FAQ needs an answer",
            );
        }
        errors.into_result()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFaqRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub is_public: Option<bool>,
    pub display_order: Option<i64>,
}

impl UpdateFaqRequest {
    pub fn validate(self) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        if let Some(question) = &self.question {
            errors.required(question, "question");
        }
        errors.into_result()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskQuestionRequest {
    pub question: String,
}

impl AskQuestionRequest {
    pub fn validate(self) -> Result<String, AppError> {
        let mut errors = FieldErrors::new();
        errors.required(&self.question, "question");
        errors.check(
            self.question.chars().count() <= MAX_QUESTION_LENGTH,
            "question",
            "Question is too long",
        );
        errors.into_result()?;
        Ok(self.question.trim().to_string())
    }
}

#[derive(Debug, Error)]
pub enum FaqError {
    #[error("FAQ not found")]
    NotFound,

    #[error("A public FAQ needs an answer")]
    PublicWithoutAnswer,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FaqError> for AppError {
    fn from(err: FaqError) -> Self {
        match err {
            FaqError::NotFound => AppError::NotFound(err.to_string()),
            FaqError::PublicWithoutAnswer => AppError::validation("answer", &err.to_string()),
            FaqError::Database(e) => AppError::from(e),
        }
    }
}

pub(crate) fn public_needs_answer(is_public: bool, answer: Option<&str>) -> Result<(), FaqError> {
    if is_public && !has_answer(answer) {
        return Err(FaqError::PublicWithoutAnswer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_public_requires_answer() {
        let request = CreateFaqRequest {
            question: "Horaires ?".to_string(),
            answer: Some("  ".to_string()),
            is_public: Some(true),
            display_order: None,
        };
        assert_matches!(
            request.validate(),
            Err(AppError::Validation { errors, .. }) if errors[0].field == "answer"
        );
        assert!(public_needs_answer(false, None).is_ok());
        assert!(public_needs_answer(true, Some("Lundi au vendredi")).is_ok());
    }

    #[test]
    fn test_question_length() {
        let request = AskQuestionRequest { question: "x".repeat(MAX_QUESTION_LENGTH + 1) };
        assert!(request.validate().is_err());
        let request = AskQuestionRequest { question: "  Parking ?  ".to_string() };
        assert_eq!(request.validate().unwrap(), "Parking ?");
    }
}
