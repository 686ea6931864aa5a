use crate::dtos::users::UserResponse;
use crate::models::Answer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnswerRequest {
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAnswerRequest {
    #[validate(length(min = 1, message = "Body cannot be empty"))]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub id: Uuid,
    pub question_id: Uuid,
    pub body: String,
    pub is_accepted: bool,
    pub author: UserResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnswerResponse {
    pub fn new(answer: Answer, author: UserResponse) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            body: answer.body,
            is_accepted: answer.is_accepted,
            author,
            created_at: answer.created_at,
            updated_at: answer.updated_at,
        }
    }
}
