//! Badge model: awards granted when a user statistic crosses a threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Broad grouping shown in badge listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Community,
    Technical,
    Participation,
    Quality,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Technical => "technical",
            Self::Participation => "participation",
            Self::Quality => "quality",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "community" => Some(Self::Community),
            "technical" => Some(Self::Technical),
            "participation" => Some(Self::Participation),
            "quality" => Some(Self::Quality),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeLevel {
    Bronze,
    Silver,
    Gold,
}

impl BadgeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            _ => None,
        }
    }
}

/// A badge definition. `criteria` is a JSON object interpreted by
/// `services::badges`, e.g. `{"type": "reputation", "threshold": 100}`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub criteria: serde_json::Value,
    pub category: String,
    pub level: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBadge {
    pub name: String,
    pub description: Option<String>,
    pub criteria: serde_json::Value,
    pub category: BadgeCategory,
    pub level: BadgeLevel,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBadge {
    pub name: Option<String>,
    pub description: Option<String>,
    pub criteria: Option<serde_json::Value>,
    pub category: Option<BadgeCategory>,
    pub level: Option<BadgeLevel>,
}

/// A badge a user has earned, with the award timestamp.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AwardedBadge {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub level: String,
    pub awarded_at: DateTime<Utc>,
}
