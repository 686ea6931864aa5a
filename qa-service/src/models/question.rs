//! Question model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub images: Option<String>,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for posting a question. Unknown tag ids are silently dropped at
/// the database layer, matching the category/tag lookup semantics.
#[derive(Debug, Clone)]
pub struct CreateQuestion {
    pub title: String,
    pub body: String,
    pub images: Option<String>,
    pub category_id: Uuid,
    pub tag_ids: Vec<Uuid>,
}

/// Partial question update; `tag_ids: Some(_)` replaces the whole tag set.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuestion {
    pub title: Option<String>,
    pub body: Option<String>,
    pub images: Option<String>,
    pub category_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
}
