//! Answer queries.

use super::Database;
use crate::models::{Answer, CreateAnswer};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const ANSWER_COLUMNS: &str =
    "id, question_id, author_id, body, is_accepted, created_at, updated_at";

impl Database {
    #[instrument(skip(self, input), fields(question_id = %input.question_id))]
    pub async fn create_answer(
        &self,
        input: &CreateAnswer,
        author_id: Uuid,
    ) -> Result<Answer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_answer"])
            .start_timer();

        let answer = sqlx::query_as::<_, Answer>(&format!(
            r#"
            INSERT INTO answers (question_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING {ANSWER_COLUMNS}
            "#
        ))
        .bind(input.question_id)
        .bind(author_id)
        .bind(&input.body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Question not found"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create answer: {}", e)),
        })?;

        timer.observe_duration();

        info!(answer_id = %answer.id, "Answer created");

        Ok(answer)
    }

    #[instrument(skip(self))]
    pub async fn get_answer(&self, answer_id: Uuid) -> Result<Option<Answer>, AppError> {
        let answer = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE id = $1"
        ))
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get answer: {}", e)))?;

        Ok(answer)
    }

    /// Answers to a question, accepted first then oldest first.
    #[instrument(skip(self))]
    pub async fn get_answers_by_question(
        &self,
        question_id: Uuid,
    ) -> Result<Vec<Answer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_answers_by_question"])
            .start_timer();

        let answers = sqlx::query_as::<_, Answer>(&format!(
            r#"
            SELECT {ANSWER_COLUMNS} FROM answers
            WHERE question_id = $1
            ORDER BY is_accepted DESC, created_at ASC
            "#
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list answers: {}", e)))?;

        timer.observe_duration();

        Ok(answers)
    }

    #[instrument(skip(self))]
    pub async fn get_answers_by_author(&self, author_id: Uuid) -> Result<Vec<Answer>, AppError> {
        let answers = sqlx::query_as::<_, Answer>(&format!(
            r#"
            SELECT {ANSWER_COLUMNS} FROM answers
            WHERE author_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list answers: {}", e)))?;

        Ok(answers)
    }

    #[instrument(skip(self, body))]
    pub async fn update_answer(
        &self,
        answer_id: Uuid,
        body: &str,
    ) -> Result<Option<Answer>, AppError> {
        let answer = sqlx::query_as::<_, Answer>(&format!(
            r#"
            UPDATE answers SET body = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ANSWER_COLUMNS}
            "#
        ))
        .bind(answer_id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update answer: {}", e)))?;

        Ok(answer)
    }

    #[instrument(skip(self))]
    pub async fn delete_answer(&self, answer_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM answers WHERE id = $1")
            .bind(answer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete answer: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark an answer as accepted, clearing any previously accepted answer
    /// on the same question. One accepted answer per question.
    #[instrument(skip(self))]
    pub async fn accept_answer(&self, answer_id: Uuid) -> Result<Option<Answer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["accept_answer"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            UPDATE answers SET is_accepted = FALSE, updated_at = NOW()
            WHERE question_id = (SELECT question_id FROM answers WHERE id = $1)
              AND is_accepted
            "#,
        )
        .bind(answer_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to clear accepted answer: {}", e))
        })?;

        let answer = sqlx::query_as::<_, Answer>(&format!(
            r#"
            UPDATE answers SET is_accepted = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING {ANSWER_COLUMNS}
            "#
        ))
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to accept answer: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        if let Some(a) = &answer {
            info!(answer_id = %a.id, question_id = %a.question_id, "Answer accepted");
        }

        Ok(answer)
    }
}
