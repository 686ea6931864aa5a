//! Vote models for questions and answers.
//!
//! Votes are stored as signed integers (+1/-1) with a uniqueness
//! constraint per (user, target); toggling semantics live in
//! `services::database::votes`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Direction of a vote as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    /// Signed integer stored in the database.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Reputation delta for the content author when this vote lands on a
    /// question. Upvote +5, downvote -1.
    pub fn question_reputation_delta(self) -> i32 {
        match self {
            Self::Up => 5,
            Self::Down => -1,
        }
    }

    /// Reputation delta for the content author when this vote lands on an
    /// answer. Upvote +10, downvote -2.
    pub fn answer_reputation_delta(self) -> i32 {
        match self {
            Self::Up => 10,
            Self::Down => -2,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionVote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub vote_value: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerVote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub answer_id: Uuid,
    pub vote_value: i32,
    pub created_at: DateTime<Utc>,
}

/// What happened when a vote request was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote by this user on this target.
    Created,
    /// The stored vote already matched the request; nothing changed.
    Unchanged,
    /// An opposite vote was flipped.
    Flipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_value_integer_round_trip() {
        assert_eq!(VoteValue::from_i32(VoteValue::Up.as_i32()), Some(VoteValue::Up));
        assert_eq!(VoteValue::from_i32(VoteValue::Down.as_i32()), Some(VoteValue::Down));
        assert_eq!(VoteValue::from_i32(0), None);
    }

    #[test]
    fn reputation_deltas_match_platform_rules() {
        assert_eq!(VoteValue::Up.question_reputation_delta(), 5);
        assert_eq!(VoteValue::Down.question_reputation_delta(), -1);
        assert_eq!(VoteValue::Up.answer_reputation_delta(), 10);
        assert_eq!(VoteValue::Down.answer_reputation_delta(), -2);
    }
}
