//! Notification handlers, all scoped to the authenticated caller.

use crate::dtos::common::{Paginated, PaginationQuery};
use crate::dtos::notifications::{MarkAllReadResponse, UnreadCountResponse};
use crate::middleware::auth::AuthUser;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

// Not flattened into PaginationQuery: serde_urlencoded cannot
// deserialize numeric fields through #[serde(flatten)].
#[derive(Debug, serde::Deserialize)]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = PaginationQuery {
        limit: query.limit.unwrap_or(20),
        offset: query.offset.unwrap_or(0),
    }
    .clamped();
    let (items, total) = state
        .db
        .get_notifications(
            auth.user_id,
            pagination.limit,
            pagination.offset,
            query.unread_only,
        )
        .await?;

    Ok(Json(Paginated {
        items,
        total,
        limit: pagination.limit,
        offset: pagination.offset,
    }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let unread = state.db.count_unread_notifications(auth.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let notification = state
        .db
        .mark_notification_read(auth.user_id, notification_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Notification not found")))?;

    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let marked_read = state.db.mark_all_notifications_read(auth.user_id).await?;
    Ok(Json(MarkAllReadResponse { marked_read }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .db
        .delete_notification(auth.user_id, notification_id)
        .await?
    {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Notification not found"
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
