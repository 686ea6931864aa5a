use crate::dtos::users::UserResponse;
use crate::models::{Category, Tag};
use crate::services::database::QuestionDetail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,

    pub images: Option<String>,
    pub category_id: Uuid,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Body cannot be empty"))]
    pub body: Option<String>,

    pub images: Option<String>,
    pub category_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// A question with its author, category, and tags embedded.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub images: Option<String>,
    pub view_count: i32,
    pub author: UserResponse,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuestionDetail> for QuestionResponse {
    fn from(detail: QuestionDetail) -> Self {
        Self {
            id: detail.question.id,
            title: detail.question.title,
            body: detail.question.body,
            images: detail.question.images,
            view_count: detail.question.view_count,
            author: detail.author.into(),
            category: detail.category,
            tags: detail.tags,
            created_at: detail.question.created_at,
            updated_at: detail.question.updated_at,
        }
    }
}
