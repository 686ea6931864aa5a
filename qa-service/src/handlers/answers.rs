use crate::dtos::answers::{AnswerResponse, CreateAnswerRequest, UpdateAnswerRequest};
use crate::middleware::auth::AuthUser;
use crate::models::{Answer, CreateAnswer, CreateNotification};
use crate::services::metrics::{record_notification_emitted, ANSWERS_CREATED_TOTAL};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

pub async fn create_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(question_id): Path<Uuid>,
    Json(request): Json<CreateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let question = state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    let answer = state
        .db
        .create_answer(
            &CreateAnswer {
                question_id,
                body: request.body,
            },
            auth.user_id,
        )
        .await?;

    if let Some(counter) = ANSWERS_CREATED_TOTAL.get() {
        counter.inc();
    }

    // Do not notify when the author answers their own question.
    if question.author_id != auth.user_id {
        state
            .db
            .create_notification(&CreateNotification::answer_posted(
                question.author_id,
                question.id,
                &question.title,
                answer.id,
            ))
            .await?;
        record_notification_emitted("answer_posted");
    }

    if let Err(e) = crate::services::badges::check_and_award(&state.db, auth.user_id).await {
        warn!(error = %e, "Badge evaluation failed after answer");
    }

    let response = to_responses(&state, vec![answer]).await?.remove(0);

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_answer(
    State(state): State<AppState>,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let answer = state
        .db
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;

    let response = to_responses(&state, vec![answer]).await?.remove(0);
    Ok(Json(response))
}

pub async fn get_answers_by_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    let answers = state.db.get_answers_by_question(question_id).await?;
    Ok(Json(to_responses(&state, answers).await?))
}

pub async fn get_answers_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let answers = state.db.get_answers_by_author(user_id).await?;
    Ok(Json(to_responses(&state, answers).await?))
}

pub async fn update_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
    Json(request): Json<UpdateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let existing = state
        .db
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;
    auth.require_owner_or_moderator(existing.author_id)?;

    let answer = state
        .db
        .update_answer(answer_id, &request.body)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;

    let response = to_responses(&state, vec![answer]).await?.remove(0);
    Ok(Json(response))
}

pub async fn delete_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let existing = state
        .db
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;
    auth.require_owner_or_moderator(existing.author_id)?;

    state.db.delete_answer(answer_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Only the question author can accept an answer.
pub async fn accept_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let answer = state
        .db
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;

    let question = state
        .db
        .get_question(answer.question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    if question.author_id != auth.user_id {
        return Err(AppError::Forbidden(
            anyhow::anyhow!("Only the question author can accept an answer"),
        ));
    }

    let already_accepted = answer.is_accepted;
    let answer = state
        .db
        .accept_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;

    if !already_accepted && answer.author_id != auth.user_id {
        state
            .db
            .create_notification(&CreateNotification::answer_accepted(
                answer.author_id,
                question.id,
                &question.title,
            ))
            .await?;
        record_notification_emitted("answer_accepted");
    }

    if let Err(e) = crate::services::badges::check_and_award(&state.db, answer.author_id).await {
        warn!(error = %e, "Badge evaluation failed after accept");
    }

    let response = to_responses(&state, vec![answer]).await?.remove(0);
    Ok(Json(response))
}

async fn to_responses(
    state: &AppState,
    answers: Vec<Answer>,
) -> Result<Vec<AnswerResponse>, AppError> {
    let mut author_ids: Vec<Uuid> = answers.iter().map(|a| a.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, crate::dtos::users::UserResponse> = state
        .db
        .get_users_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.into()))
        .collect();

    answers
        .into_iter()
        .map(|answer| {
            let author = authors
                .get(&answer.author_id)
                .cloned()
                .ok_or_else(|| AppError::DatabaseError(anyhow::anyhow!("Answer author missing")))?;
            Ok(AnswerResponse::new(answer, author))
        })
        .collect()
}
