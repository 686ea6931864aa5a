//! Badge queries.

use super::Database;
use crate::models::{AwardedBadge, Badge, CreateBadge, UpdateBadge};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const BADGE_COLUMNS: &str =
    "id, name, description, criteria, category, level, created_at, updated_at";

impl Database {
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_badge(&self, input: &CreateBadge) -> Result<Badge, AppError> {
        let badge = sqlx::query_as::<_, Badge>(&format!(
            r#"
            INSERT INTO badges (name, description, criteria, category, level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BADGE_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.criteria)
        .bind(input.category.as_str())
        .bind(input.level.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Badge name already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create badge: {}", e)),
        })?;

        Ok(badge)
    }

    #[instrument(skip(self))]
    pub async fn get_badge(&self, badge_id: Uuid) -> Result<Option<Badge>, AppError> {
        let badge = sqlx::query_as::<_, Badge>(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges WHERE id = $1"
        ))
        .bind(badge_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get badge: {}", e)))?;

        Ok(badge)
    }

    /// List badges ordered by name, optionally narrowed to a category
    /// and/or level.
    #[instrument(skip(self))]
    pub async fn list_badges(
        &self,
        category: Option<&str>,
        level: Option<&str>,
    ) -> Result<Vec<Badge>, AppError> {
        let badges = sqlx::query_as::<_, Badge>(&format!(
            r#"
            SELECT {BADGE_COLUMNS} FROM badges
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR level = $2)
            ORDER BY name
            "#
        ))
        .bind(category)
        .bind(level)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list badges: {}", e)))?;

        Ok(badges)
    }

    #[instrument(skip(self, update))]
    pub async fn update_badge(
        &self,
        badge_id: Uuid,
        update: &UpdateBadge,
    ) -> Result<Option<Badge>, AppError> {
        let badge = sqlx::query_as::<_, Badge>(&format!(
            r#"
            UPDATE badges SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                criteria = COALESCE($4, criteria),
                category = COALESCE($5, category),
                level = COALESCE($6, level),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BADGE_COLUMNS}
            "#
        ))
        .bind(badge_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.criteria)
        .bind(update.category.map(|c| c.as_str()))
        .bind(update.level.map(|l| l.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Badge name already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update badge: {}", e)),
        })?;

        Ok(badge)
    }

    #[instrument(skip(self))]
    pub async fn delete_badge(&self, badge_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM badges WHERE id = $1")
            .bind(badge_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete badge: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Grant a badge. Returns false when the user already holds it.
    #[instrument(skip(self))]
    pub async fn award_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["award_badge"])
            .start_timer();

        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_id, badge_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to award badge: {}", e)))?;

        timer.observe_duration();

        let awarded = result.rows_affected() > 0;
        if awarded {
            info!(%user_id, %badge_id, "Badge awarded");
        }

        Ok(awarded)
    }

    #[instrument(skip(self))]
    pub async fn user_has_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool, AppError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM user_badges WHERE user_id = $1 AND badge_id = $2)",
        )
        .bind(user_id)
        .bind(badge_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check badge: {}", e)))?;

        Ok(exists.0)
    }

    /// Badges a user has earned, newest award first.
    #[instrument(skip(self))]
    pub async fn get_user_badges(&self, user_id: Uuid) -> Result<Vec<AwardedBadge>, AppError> {
        let badges = sqlx::query_as::<_, AwardedBadge>(
            r#"
            SELECT b.id, b.name, b.description, b.category, b.level, ub.awarded_at
            FROM badges b
            JOIN user_badges ub ON ub.badge_id = b.id
            WHERE ub.user_id = $1
            ORDER BY ub.awarded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user badges: {}", e)))?;

        Ok(badges)
    }

    #[instrument(skip(self))]
    pub async fn count_answers_by_author(&self, author_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM answers WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count answers: {}", e))
            })?;
        Ok(count.0)
    }

    #[instrument(skip(self))]
    pub async fn count_accepted_answers_by_author(&self, author_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM answers WHERE author_id = $1 AND is_accepted",
        )
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count accepted answers: {}", e))
        })?;
        Ok(count.0)
    }

    #[instrument(skip(self))]
    pub async fn count_questions_by_author(&self, author_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count questions: {}", e))
            })?;
        Ok(count.0)
    }
}
