use crate::models::{BadgeCategory, BadgeLevel};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBadgeRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub description: Option<String>,

    /// Criteria JSON, e.g. `{"type": "reputation", "threshold": 100}`.
    pub criteria: serde_json::Value,

    pub category: BadgeCategory,
    pub level: BadgeLevel,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBadgeRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub criteria: Option<serde_json::Value>,
    pub category: Option<BadgeCategory>,
    pub level: Option<BadgeLevel>,
}
