//! Badge handlers. Definitions are admin-managed; listings are public.

use crate::dtos::badges::{CreateBadgeRequest, UpdateBadgeRequest};
use crate::middleware::auth::AuthUser;
use crate::models::{BadgeCategory, BadgeLevel, CreateBadge, UpdateBadge};
use crate::services::badges::BadgeCriteria;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub async fn create_badge(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateBadgeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;
    request.validate()?;

    if BadgeCriteria::parse(&request.criteria).is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Unrecognized badge criteria"
        )));
    }

    let badge = state
        .db
        .create_badge(&CreateBadge {
            name: request.name,
            description: request.description,
            criteria: request.criteria,
            category: request.category,
            level: request.level,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(badge)))
}

#[derive(Debug, serde::Deserialize)]
pub struct BadgeListQuery {
    pub category: Option<BadgeCategory>,
    pub level: Option<BadgeLevel>,
}

pub async fn list_badges(
    State(state): State<AppState>,
    Query(filter): Query<BadgeListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let badges = state
        .db
        .list_badges(
            filter.category.map(|c| c.as_str()),
            filter.level.map(|l| l.as_str()),
        )
        .await?;
    Ok(Json(badges))
}

pub async fn get_badge(
    State(state): State<AppState>,
    Path(badge_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let badge = state
        .db
        .get_badge(badge_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Badge not found")))?;

    Ok(Json(badge))
}

pub async fn update_badge(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(badge_id): Path<Uuid>,
    Json(request): Json<UpdateBadgeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;
    request.validate()?;

    if let Some(criteria) = &request.criteria {
        if BadgeCriteria::parse(criteria).is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unrecognized badge criteria"
            )));
        }
    }

    let badge = state
        .db
        .update_badge(
            badge_id,
            &UpdateBadge {
                name: request.name,
                description: request.description,
                criteria: request.criteria,
                category: request.category,
                level: request.level,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Badge not found")))?;

    Ok(Json(badge))
}

pub async fn delete_badge(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(badge_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;

    if !state.db.delete_badge(badge_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Badge not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}
