//! Tag queries.

use super::Database;
use crate::models::Tag;
use service_core::error::AppError;
use tracing::instrument;
use uuid::Uuid;

const TAG_COLUMNS: &str = "id, name, created_at, updated_at";

impl Database {
    #[instrument(skip(self))]
    pub async fn create_tag(&self, name: &str) -> Result<Tag, AppError> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            "INSERT INTO tags (name) VALUES ($1) RETURNING {TAG_COLUMNS}"
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Tag name already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create tag: {}", e)),
        })?;

        Ok(tag)
    }

    #[instrument(skip(self))]
    pub async fn get_tag(&self, tag_id: Uuid) -> Result<Option<Tag>, AppError> {
        let tag =
            sqlx::query_as::<_, Tag>(&format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"))
                .bind(tag_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to get tag: {}", e))
                })?;

        Ok(tag)
    }

    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let tags =
            sqlx::query_as::<_, Tag>(&format!("SELECT {TAG_COLUMNS} FROM tags ORDER BY name"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to list tags: {}", e))
                })?;

        Ok(tags)
    }

    #[instrument(skip(self))]
    pub async fn update_tag(&self, tag_id: Uuid, name: &str) -> Result<Option<Tag>, AppError> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            r#"
            UPDATE tags SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TAG_COLUMNS}
            "#
        ))
        .bind(tag_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Tag name already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update tag: {}", e)),
        })?;

        Ok(tag)
    }

    /// Question joins cascade away with the tag.
    #[instrument(skip(self))]
    pub async fn delete_tag(&self, tag_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete tag: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
