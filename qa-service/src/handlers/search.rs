use crate::dtos::questions::QuestionResponse;
use crate::dtos::users::UserResponse;
use crate::models::Tag;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use service_core::error::AppError;

const SEARCH_RESULT_LIMIT: i64 = 20;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub questions: Vec<QuestionResponse>,
    pub users: Vec<UserResponse>,
    pub tags: Vec<Tag>,
}

/// Fuzzy search across question titles, usernames, and tag names.
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let query = query.trim().to_string();
    if query.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Search query cannot be empty"
        )));
    }

    let results = state.db.search(&query, SEARCH_RESULT_LIMIT).await?;

    let questions = state
        .db
        .question_details(results.questions)
        .await?
        .into_iter()
        .map(QuestionResponse::from)
        .collect();

    Ok(Json(SearchResponse {
        query,
        questions,
        users: results.users.into_iter().map(UserResponse::from).collect(),
        tags: results.tags,
    }))
}
