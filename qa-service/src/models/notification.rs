//! Notification model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    AnswerPosted,
    AnswerAccepted,
    BadgeEarned,
    NewFollower,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnswerPosted => "answer_posted",
            Self::AnswerAccepted => "answer_accepted",
            Self::BadgeEarned => "badge_earned",
            Self::NewFollower => "new_follower",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for enqueueing a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub message: String,
    pub link: Option<String>,
}

impl CreateNotification {
    /// Notification for the question author when a new answer arrives.
    pub fn answer_posted(
        question_author_id: Uuid,
        question_id: Uuid,
        question_title: &str,
        answer_id: Uuid,
    ) -> Self {
        Self {
            user_id: question_author_id,
            notification_type: NotificationType::AnswerPosted,
            message: format!("Someone answered your question: '{}'", question_title),
            link: Some(format!("/questions/{}#answer-{}", question_id, answer_id)),
        }
    }

    /// Notification for the answer author when their answer is accepted.
    pub fn answer_accepted(answer_author_id: Uuid, question_id: Uuid, question_title: &str) -> Self {
        Self {
            user_id: answer_author_id,
            notification_type: NotificationType::AnswerAccepted,
            message: format!(
                "Your answer was accepted for the question: '{}'",
                question_title
            ),
            link: Some(format!("/questions/{}", question_id)),
        }
    }

    /// Notification for a freshly earned badge.
    pub fn badge_earned(user_id: Uuid, badge_name: &str, badge_id: Uuid) -> Self {
        Self {
            user_id,
            notification_type: NotificationType::BadgeEarned,
            message: format!("Congratulations! You earned the '{}' badge", badge_name),
            link: Some(format!("/badges/{}", badge_id)),
        }
    }

    /// Notification for a new follower.
    pub fn new_follower(user_id: Uuid, follower_username: &str, follower_id: Uuid) -> Self {
        Self {
            user_id,
            notification_type: NotificationType::NewFollower,
            message: format!("{} started following you", follower_username),
            link: Some(format!("/users/{}", follower_id)),
        }
    }
}
