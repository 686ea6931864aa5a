//! Notification queries. Every read and mutation is scoped to the owning
//! user so one account can never touch another's inbox.

use super::Database;
use crate::models::{CreateNotification, Notification};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::instrument;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str = "id, user_id, type, message, link, is_read, created_at";

impl Database {
    #[instrument(skip(self, input), fields(user_id = %input.user_id, kind = input.notification_type.as_str()))]
    pub async fn create_notification(
        &self,
        input: &CreateNotification,
    ) -> Result<Notification, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_notification"])
            .start_timer();

        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, type, message, link)
            VALUES ($1, $2, $3, $4)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(input.user_id)
        .bind(input.notification_type.as_str())
        .bind(&input.message)
        .bind(&input.link)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create notification: {}", e))
        })?;

        timer.observe_duration();

        Ok(notification)
    }

    /// Page of a user's notifications, newest first, plus the total count.
    /// `unread_only` restricts both the page and the total to unread rows.
    #[instrument(skip(self))]
    pub async fn get_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
        unread_only: bool,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_notifications"])
            .start_timer();

        let items = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE user_id = $1 AND (NOT $4 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list notifications: {}", e))
        })?;

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count notifications: {}", e))
        })?;

        timer.observe_duration();

        Ok((items, total.0))
    }

    #[instrument(skip(self))]
    pub async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count unread: {}", e))
        })?;

        Ok(count.0)
    }

    /// Mark one notification read. Returns None when it does not exist or
    /// belongs to someone else.
    #[instrument(skip(self))]
    pub async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to mark notification read: {}", e))
        })?;

        Ok(notification)
    }

    /// Mark everything read; returns how many rows changed.
    #[instrument(skip(self))]
    pub async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to mark all read: {}", e))
        })?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    pub async fn delete_notification(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete notification: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
