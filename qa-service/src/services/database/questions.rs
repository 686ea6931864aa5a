//! Question queries.

use super::Database;
use crate::models::{Category, CreateQuestion, Question, Tag, UpdateQuestion, User};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

/// A question joined with everything its API representation embeds.
#[derive(Debug, Clone)]
pub struct QuestionDetail {
    pub question: Question,
    pub author: User,
    pub category: Category,
    pub tags: Vec<Tag>,
}

impl Database {
    /// Post a question. Unknown category is NotFound; unknown tag ids are
    /// dropped by the join insert.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_question(
        &self,
        input: &CreateQuestion,
        author_id: Uuid,
    ) -> Result<Question, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_question"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (title, body, images, author_id, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            "#,
        )
        .bind(&input.title)
        .bind(&input.body)
        .bind(&input.images)
        .bind(author_id)
        .bind(input.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Category not found"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create question: {}", e)),
        })?;

        if !input.tag_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO question_tags (question_id, tag_id)
                SELECT $1, id FROM tags WHERE id = ANY($2)
                "#,
            )
            .bind(question.id)
            .bind(&input.tag_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to attach tags: {}", e)))?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(question_id = %question.id, "Question created");

        Ok(question)
    }

    #[instrument(skip(self))]
    pub async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_question"])
            .start_timer();

        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            FROM questions WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get question: {}", e)))?;

        timer.observe_duration();

        Ok(question)
    }

    /// Bump the view counter; fire-and-forget semantics are fine here so
    /// the read path does not wait on row locks.
    #[instrument(skip(self))]
    pub async fn increment_view_count(&self, question_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE questions SET view_count = view_count + 1 WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to bump view count: {}", e))
            })?;
        Ok(())
    }

    /// List questions, newest first.
    #[instrument(skip(self))]
    pub async fn list_questions(&self, limit: i64, offset: i64) -> Result<Vec<Question>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_questions"])
            .start_timer();

        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            FROM questions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list questions: {}", e)))?;

        timer.observe_duration();

        Ok(questions)
    }

    #[instrument(skip(self))]
    pub async fn count_questions(&self) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count questions: {}", e))
            })?;
        Ok(count.0)
    }

    #[instrument(skip(self))]
    pub async fn get_questions_by_category(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            FROM questions WHERE category_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list questions: {}", e)))?;

        Ok(questions)
    }

    #[instrument(skip(self))]
    pub async fn get_questions_by_tag(&self, tag_id: Uuid) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT q.id, q.title, q.body, q.images, q.author_id, q.category_id, q.view_count, q.created_at, q.updated_at
            FROM questions q
            JOIN question_tags qt ON qt.question_id = q.id
            WHERE qt.tag_id = $1
            ORDER BY q.created_at DESC
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list questions: {}", e)))?;

        Ok(questions)
    }

    #[instrument(skip(self))]
    pub async fn get_questions_by_author(&self, author_id: Uuid) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            FROM questions WHERE author_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list questions: {}", e)))?;

        Ok(questions)
    }

    /// Case-insensitive substring match on the title.
    #[instrument(skip(self))]
    pub async fn get_questions_by_title(&self, fragment: &str) -> Result<Vec<Question>, AppError> {
        let pattern = format!("%{}%", fragment.replace('%', "\\%").replace('_', "\\_"));
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            FROM questions WHERE title ILIKE $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search titles: {}", e)))?;

        Ok(questions)
    }

    /// Update a question; `tag_ids: Some(_)` replaces the tag set.
    #[instrument(skip(self, update))]
    pub async fn update_question(
        &self,
        question_id: Uuid,
        update: &UpdateQuestion,
    ) -> Result<Option<Question>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_question"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions SET
                title = COALESCE($2, title),
                body = COALESCE($3, body),
                images = COALESCE($4, images),
                category_id = COALESCE($5, category_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            "#,
        )
        .bind(question_id)
        .bind(&update.title)
        .bind(&update.body)
        .bind(&update.images)
        .bind(update.category_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update question: {}", e)))?;

        let Some(question) = question else {
            return Ok(None);
        };

        if let Some(tag_ids) = &update.tag_ids {
            sqlx::query("DELETE FROM question_tags WHERE question_id = $1")
                .bind(question_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to clear tags: {}", e))
                })?;

            if !tag_ids.is_empty() {
                sqlx::query(
                    r#"
                    INSERT INTO question_tags (question_id, tag_id)
                    SELECT $1, id FROM tags WHERE id = ANY($2)
                    "#,
                )
                .bind(question_id)
                .bind(tag_ids)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to attach tags: {}", e))
                })?;
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        Ok(Some(question))
    }

    /// Delete a question; answers, votes, and tag joins cascade.
    #[instrument(skip(self))]
    pub async fn delete_question(&self, question_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_question"])
            .start_timer();

        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete question: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    /// Tags attached to a single question.
    #[instrument(skip(self))]
    pub async fn get_question_tags(&self, question_id: Uuid) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at
            FROM tags t
            JOIN question_tags qt ON qt.tag_id = t.id
            WHERE qt.question_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get tags: {}", e)))?;

        Ok(tags)
    }

    /// Assemble API-facing question details with three batched lookups
    /// instead of per-row queries.
    #[instrument(skip(self, questions), fields(count = questions.len()))]
    pub async fn question_details(
        &self,
        questions: Vec<Question>,
    ) -> Result<Vec<QuestionDetail>, AppError> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let mut author_ids: Vec<Uuid> = questions.iter().map(|q| q.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let mut category_ids: Vec<Uuid> = questions.iter().map(|q| q.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();

        let authors: HashMap<Uuid, User> = self
            .get_users_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let categories: HashMap<Uuid, Category> = self
            .get_categories_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let tag_rows: Vec<(Uuid, Tag)> = sqlx::query_as::<_, (Uuid, Uuid, String, chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)>(
            r#"
            SELECT qt.question_id, t.id, t.name, t.created_at, t.updated_at
            FROM tags t
            JOIN question_tags qt ON qt.tag_id = t.id
            WHERE qt.question_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get tags: {}", e)))?
        .into_iter()
        .map(|(question_id, id, name, created_at, updated_at)| {
            (
                question_id,
                Tag {
                    id,
                    name,
                    created_at,
                    updated_at,
                },
            )
        })
        .collect();

        let mut tags_by_question: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (question_id, tag) in tag_rows {
            tags_by_question.entry(question_id).or_default().push(tag);
        }

        let mut details = Vec::with_capacity(questions.len());
        for question in questions {
            let author = authors.get(&question.author_id).cloned().ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!("Question author missing"))
            })?;
            let category = categories.get(&question.category_id).cloned().ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!("Question category missing"))
            })?;
            let tags = tags_by_question.remove(&question.id).unwrap_or_default();
            details.push(QuestionDetail {
                question,
                author,
                category,
                tags,
            });
        }

        Ok(details)
    }
}
