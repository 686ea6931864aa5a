use crate::dtos::votes::{VoteRequest, VoteResponse};
use crate::middleware::auth::AuthUser;
use crate::models::VoteValue;
use crate::services::metrics::record_vote_cast;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use tracing::warn;
use uuid::Uuid;

pub async fn vote_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(question_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    if question.author_id == auth.user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "You cannot vote on your own question"
        )));
    }

    let outcome = state
        .db
        .vote_question(auth.user_id, question_id, question.author_id, request.vote)
        .await?;

    record_vote_cast("question", request.vote.as_str());

    if let Err(e) = crate::services::badges::check_and_award(&state.db, question.author_id).await {
        warn!(error = %e, "Badge evaluation failed after vote");
    }

    let tally = state.db.question_vote_tally(question_id).await?;
    Ok(Json(VoteResponse::new(outcome, Some(request.vote), tally)))
}

pub async fn retract_question_vote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    if !state
        .db
        .retract_question_vote(auth.user_id, question_id, question.author_id)
        .await?
    {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "You have not voted on this question"
        )));
    }

    let tally = state.db.question_vote_tally(question_id).await?;
    Ok(Json(serde_json::json!({
        "retracted": true,
        "upvotes": tally.upvotes,
        "downvotes": tally.downvotes,
        "score": tally.score,
    })))
}

pub async fn get_question_votes(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Question not found")))?;

    let tally = state.db.question_vote_tally(question_id).await?;
    let voters = state.db.question_voters(question_id).await?;
    Ok(Json(serde_json::json!({
        "upvotes": tally.upvotes,
        "downvotes": tally.downvotes,
        "score": tally.score,
        "votes": voters,
    })))
}

/// The caller's own vote on a question.
pub async fn get_my_question_vote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let vote = state.db.get_question_vote(auth.user_id, question_id).await?;
    let my_vote = vote
        .and_then(|v| VoteValue::from_i32(v.vote_value))
        .map(VoteValue::as_str);
    Ok(Json(serde_json::json!({ "my_vote": my_vote })))
}

pub async fn vote_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let answer = state
        .db
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;

    if answer.author_id == auth.user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "You cannot vote on your own answer"
        )));
    }

    let outcome = state
        .db
        .vote_answer(auth.user_id, answer_id, answer.author_id, request.vote)
        .await?;

    record_vote_cast("answer", request.vote.as_str());

    if let Err(e) = crate::services::badges::check_and_award(&state.db, answer.author_id).await {
        warn!(error = %e, "Badge evaluation failed after vote");
    }

    let tally = state.db.answer_vote_tally(answer_id).await?;
    Ok(Json(VoteResponse::new(outcome, Some(request.vote), tally)))
}

pub async fn retract_answer_vote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let answer = state
        .db
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;

    if !state
        .db
        .retract_answer_vote(auth.user_id, answer_id, answer.author_id)
        .await?
    {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "You have not voted on this answer"
        )));
    }

    let tally = state.db.answer_vote_tally(answer_id).await?;
    Ok(Json(serde_json::json!({
        "retracted": true,
        "upvotes": tally.upvotes,
        "downvotes": tally.downvotes,
        "score": tally.score,
    })))
}

pub async fn get_answer_votes(
    State(state): State<AppState>,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Answer not found")))?;

    let tally = state.db.answer_vote_tally(answer_id).await?;
    let voters = state.db.answer_voters(answer_id).await?;
    Ok(Json(serde_json::json!({
        "upvotes": tally.upvotes,
        "downvotes": tally.downvotes,
        "score": tally.score,
        "votes": voters,
    })))
}

/// The caller's own vote on an answer.
pub async fn get_my_answer_vote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let vote = state.db.get_answer_vote(auth.user_id, answer_id).await?;
    let my_vote = vote
        .and_then(|v| VoteValue::from_i32(v.vote_value))
        .map(VoteValue::as_str);
    Ok(Json(serde_json::json!({ "my_vote": my_vote })))
}
