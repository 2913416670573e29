use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use shared_database::AppState;

use crate::models::{public_needs_answer, CreateFaqRequest, Faq, FaqError, UpdateFaqRequest};

const FAQ_COLUMNS: &str =
    "id, question, answer, is_public, display_order, asked_by, answered_by, created_at, updated_at";

pub struct FaqService {
    db: SqlitePool,
}

impl FaqService {
    pub fn new(state: &AppState) -> Self {
        Self { db: state.db.clone() }
    }

    /// Published entries in display order.
    pub async fn list_public(&self) -> Result<Vec<Faq>, FaqError> {
        let faqs = sqlx::query_as::<_, Faq>(&format!(
            "SELECT {} FROM faqs
             WHERE deleted_at IS NULL AND is_public = 1 AND answer IS NOT NULL AND TRIM(answer) <> ''
             ORDER BY display_order, id",
            FAQ_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(faqs)
    }

    /// Everything, unanswered questions first.
    pub async fn list_all(&self) -> Result<Vec<Faq>, FaqError> {
        let faqs = sqlx::query_as::<_, Faq>(&format!(
            "SELECT {} FROM faqs WHERE deleted_at IS NULL
             ORDER BY (answer IS NOT NULL AND TRIM(answer) <> ''), display_order, id",
            FAQ_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(faqs)
    }

    pub async fn get(&self, id: i64) -> Result<Faq, FaqError> {
        sqlx::query_as::<_, Faq>(&format!(
            "SELECT {} FROM faqs WHERE id = ? AND deleted_at IS NULL",
            FAQ_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(FaqError::NotFound)
    }

    pub async fn create(&self, request: CreateFaqRequest, author: i64) -> Result<Faq, FaqError> {
        let is_public = request.is_public.unwrap_or(false);
        public_needs_answer(is_public, request.answer.as_deref())?;

        let answered_by = request.answer.as_ref().map(|_| author);
        let now = Utc::now();
        let faq = sqlx::query_as::<_, Faq>(&format!(
            "INSERT INTO faqs (question, answer, is_public, display_order, asked_by, answered_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, NULL, ?, ?, ?) RETURNING {}",
            FAQ_COLUMNS
        ))
        .bind(request.question.trim())
        .bind(request.answer)
        .bind(is_public)
        .bind(request.display_order.unwrap_or(0))
        .bind(answered_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        info!("FAQ {} created", faq.id);
        Ok(faq)
    }

    pub async fn update(&self, id: i64, changes: UpdateFaqRequest, editor: i64) -> Result<Faq, FaqError> {
        let current = self.get(id).await?;

        let answer = changes.answer.clone().or(current.answer);
        let is_public = changes.is_public.unwrap_or(current.is_public);
        public_needs_answer(is_public, answer.as_deref())?;

        let answered_by = if changes.answer.is_some() {
            Some(editor)
        } else {
            current.answered_by
        };

        let faq = sqlx::query_as::<_, Faq>(&format!(
            "UPDATE faqs SET question = ?, answer = ?, is_public = ?, display_order = ?, answered_by = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL RETURNING {}",
            FAQ_COLUMNS
        ))
        .bind(changes.question.unwrap_or(current.question))
        .bind(answer)
        .bind(is_public)
        .bind(changes.display_order.unwrap_or(current.display_order))
        .bind(answered_by)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(FaqError::NotFound)?;

        debug!("FAQ {} updated", id);
        Ok(faq)
    }

    pub async fn delete(&self, id: i64) -> Result<(), FaqError> {
        let result = sqlx::query(
            "UPDATE faqs SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FaqError::NotFound);
        }
        Ok(())
    }

    /// Stored private and unanswered until an administrator publishes it.
    pub async fn ask(&self, question: &str, asked_by: i64) -> Result<Faq, FaqError> {
        let now = Utc::now();
        let faq = sqlx::query_as::<_, Faq>(&format!(
            "INSERT INTO faqs (question, answer, is_public, display_order, asked_by, answered_by, created_at, updated_at)
             VALUES (?, NULL, 0, 0, ?, NULL, ?, ?) RETURNING {}",
            FAQ_COLUMNS
        ))
        .bind(question)
        .bind(asked_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        info!("Question {} submitted by user {}", faq.id, asked_by);
        Ok(faq)
    }

    pub async fn count_unanswered(&self) -> Result<i64, FaqError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM faqs WHERE deleted_at IS NULL AND (answer IS NULL OR TRIM(answer) = '')",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }
}
