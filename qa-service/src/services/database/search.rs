//! Fuzzy search backed by the pg_trgm extension. A trigram similarity
//! above 0.3 counts as a match; results come back most-similar first.

use super::Database;
use crate::models::{Question, Tag, User};
use crate::services::metrics::DB_QUERY_DURATION;
use serde::Serialize;
use service_core::error::AppError;
use tracing::instrument;

const SIMILARITY_THRESHOLD: f32 = 0.3;

/// Matches across the three searchable entity kinds.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub questions: Vec<Question>,
    pub users: Vec<User>,
    pub tags: Vec<Tag>,
}

impl Database {
    /// Questions whose title is similar to the query, or whose title or
    /// body contains it as a substring.
    #[instrument(skip(self))]
    pub async fn search_questions(&self, query: &str, limit: i64) -> Result<Vec<Question>, AppError> {
        let pattern = format!("%{}%", escape_like(query));
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, title, body, images, author_id, category_id, view_count, created_at, updated_at
            FROM questions
            WHERE similarity(title, $1) > $2
               OR title ILIKE $3
               OR body ILIKE $3
            ORDER BY similarity(title, $1) DESC
            LIMIT $4
            "#,
        )
        .bind(query)
        .bind(SIMILARITY_THRESHOLD)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search questions: {}", e)))
    }

    /// Users matched on username or display name.
    #[instrument(skip(self))]
    pub async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, display_name, avatar_url, bio, social_links,
                   reputation, is_active, role, last_login, created_at, updated_at
            FROM users
            WHERE similarity(username, $1) > $2
               OR similarity(COALESCE(display_name, ''), $1) > $2
            ORDER BY GREATEST(similarity(username, $1), similarity(COALESCE(display_name, ''), $1)) DESC
            LIMIT $3
            "#,
        )
        .bind(query)
        .bind(SIMILARITY_THRESHOLD)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search users: {}", e)))
    }

    #[instrument(skip(self))]
    pub async fn search_tags(&self, query: &str, limit: i64) -> Result<Vec<Tag>, AppError> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM tags
            WHERE similarity(name, $1) > $2
            ORDER BY similarity(name, $1) DESC
            LIMIT $3
            "#,
        )
        .bind(query)
        .bind(SIMILARITY_THRESHOLD)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search tags: {}", e)))
    }

    /// Search everything at once for the global search endpoint.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: i64) -> Result<SearchResults, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search"])
            .start_timer();

        let questions = self.search_questions(query, limit).await?;
        let users = self.search_users(query, limit).await?;
        let tags = self.search_tags(query, limit).await?;

        timer.observe_duration();

        Ok(SearchResults {
            questions,
            users,
            tags,
        })
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
