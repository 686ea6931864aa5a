use crate::dtos::common::{Paginated, PaginationQuery};
use crate::dtos::questions::{CreateQuestionRequest, QuestionResponse, UpdateQuestionRequest};
use crate::middleware::auth::AuthUser;
use crate::models::{CreateQuestion, UpdateQuestion};
use crate::services::metrics::QUESTIONS_CREATED_TOTAL;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

pub async fn create_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let category = state
        .db
        .get_category(request.category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    let question = state
        .db
        .create_question(
            &CreateQuestion {
                title: request.title,
                body: request.body,
                images: request.images,
                category_id: request.category_id,
                tag_ids: request.tag_ids,
            },
            auth.user_id,
        )
        .await?;

    if let Some(counter) = QUESTIONS_CREATED_TOTAL.get() {
        counter.with_label_values(&[category.name.as_str()]).inc();
    }

    if let Err(e) = crate::services::badges::check_and_award(&state.db, auth.user_id).await {
        warn!(error = %e, "Badge evaluation failed after question");
    }

    let detail = state
        .db
        .question_details(vec![question])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Question detail missing")))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from(detail))))
}

pub async fn list_questions(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = pagination.clamped();
    let questions = state
        .db
        .list_questions(pagination.limit, pagination.offset)
        .await?;
    let total = state.db.count_questions().await?;
    let items = to_responses(&state, questions).await?;

    Ok(Json(Paginated {
        items,
        total,
        limit: pagination.limit,
        offset: pagination.offset,
    }))
}

/// Fetching a question counts as a view.
pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut question = state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    state.db.increment_view_count(question_id).await?;
    question.view_count += 1;

    let detail = state
        .db
        .question_details(vec![question])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Question detail missing")))?;

    Ok(Json(QuestionResponse::from(detail)))
}

pub async fn update_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(question_id): Path<Uuid>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let existing = state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;
    auth.require_owner_or_moderator(existing.author_id)?;

    if let Some(category_id) = request.category_id {
        state
            .db
            .get_category(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;
    }

    let question = state
        .db
        .update_question(
            question_id,
            &UpdateQuestion {
                title: request.title,
                body: request.body,
                images: request.images,
                category_id: request.category_id,
                tag_ids: request.tag_ids,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    let detail = state
        .db
        .question_details(vec![question])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Question detail missing")))?;

    Ok(Json(QuestionResponse::from(detail)))
}

pub async fn delete_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let existing = state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;
    auth.require_owner_or_moderator(existing.author_id)?;

    state.db.delete_question(question_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_questions_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    let questions = state.db.get_questions_by_category(category_id).await?;
    Ok(Json(to_responses(&state, questions).await?))
}

pub async fn get_questions_by_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_tag(tag_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tag not found")))?;

    let questions = state.db.get_questions_by_tag(tag_id).await?;
    Ok(Json(to_responses(&state, questions).await?))
}

pub async fn get_questions_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let questions = state.db.get_questions_by_author(user_id).await?;
    Ok(Json(to_responses(&state, questions).await?))
}

pub async fn get_questions_by_title(
    State(state): State<AppState>,
    Path(fragment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let questions = state.db.get_questions_by_title(&fragment).await?;
    Ok(Json(to_responses(&state, questions).await?))
}

async fn to_responses(
    state: &AppState,
    questions: Vec<crate::models::Question>,
) -> Result<Vec<QuestionResponse>, AppError> {
    Ok(state
        .db
        .question_details(questions)
        .await?
        .into_iter()
        .map(QuestionResponse::from)
        .collect())
}
