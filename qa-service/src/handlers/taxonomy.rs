//! Category and tag handlers. Reads are public; writes need moderator or
//! admin rights.

use crate::dtos::taxonomy::{
    CreateCategoryRequest, CreateTagRequest, UpdateCategoryRequest, UpdateTagRequest,
};
use crate::middleware::auth::AuthUser;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

fn require_moderator(auth: &AuthUser) -> Result<(), AppError> {
    if auth.can_moderate() {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!("Moderator access required")))
    }
}

pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_moderator(&auth)?;
    request.validate()?;

    let category = state
        .db
        .create_category(&request.name, request.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.list_categories().await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .db
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_moderator(&auth)?;
    request.validate()?;

    let category = state
        .db
        .update_category(
            category_id,
            request.name.as_deref(),
            request.description.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_moderator(&auth)?;

    if !state.db.delete_category(category_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Category not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_moderator(&auth)?;
    request.validate()?;

    let tag = state.db.create_tag(&request.name).await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.list_tags().await?))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tag = state
        .db
        .get_tag(tag_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tag not found")))?;

    Ok(Json(tag))
}

pub async fn update_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tag_id): Path<Uuid>,
    Json(request): Json<UpdateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_moderator(&auth)?;
    request.validate()?;

    let tag = state
        .db
        .update_tag(tag_id, &request.name)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tag not found")))?;

    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tag_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_moderator(&auth)?;

    if !state.db.delete_tag(tag_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Tag not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}
