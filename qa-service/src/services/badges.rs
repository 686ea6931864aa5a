//! Badge evaluation.
//!
//! Badge criteria are stored as JSON on the badge row, e.g.
//! `{"type": "reputation", "threshold": 100}`. After a qualifying action
//! (posting, voting, accepting) the handler calls [`check_and_award`],
//! which compares the user's current statistics against every badge and
//! grants the ones newly met, emitting a notification per award.

use crate::models::{CreateNotification, User};
use crate::services::database::Database;
use crate::services::metrics::{record_badge_awarded, record_notification_emitted};
use serde::Deserialize;
use service_core::error::AppError;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Parsed form of a badge's `criteria` JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeCriteria {
    AnswersPosted { threshold: i64 },
    AcceptedAnswers { threshold: i64 },
    QuestionsPosted { threshold: i64 },
    Reputation { threshold: i64 },
    UpvotesReceived { threshold: i64 },
    JoinDate { threshold_days: i64 },
}

/// Snapshot of the statistics badge criteria look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserStats {
    pub answers_posted: i64,
    pub accepted_answers: i64,
    pub questions_posted: i64,
    pub reputation: i64,
    pub upvotes_received: i64,
    pub days_since_join: i64,
}

impl BadgeCriteria {
    pub fn parse(criteria: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(criteria.clone()).ok()
    }

    pub fn is_met(&self, stats: &UserStats) -> bool {
        match *self {
            Self::AnswersPosted { threshold } => stats.answers_posted >= threshold,
            Self::AcceptedAnswers { threshold } => stats.accepted_answers >= threshold,
            Self::QuestionsPosted { threshold } => stats.questions_posted >= threshold,
            Self::Reputation { threshold } => stats.reputation >= threshold,
            Self::UpvotesReceived { threshold } => stats.upvotes_received >= threshold,
            Self::JoinDate { threshold_days } => stats.days_since_join >= threshold_days,
        }
    }
}

/// Collect the user's current statistics.
async fn gather_stats(db: &Database, user: &User) -> Result<UserStats, AppError> {
    Ok(UserStats {
        answers_posted: db.count_answers_by_author(user.id).await?,
        accepted_answers: db.count_accepted_answers_by_author(user.id).await?,
        questions_posted: db.count_questions_by_author(user.id).await?,
        reputation: i64::from(user.reputation),
        upvotes_received: db.count_upvotes_received(user.id).await?,
        days_since_join: (chrono::Utc::now() - user.created_at).num_days(),
    })
}

/// Evaluate every badge for the user and award the ones newly met.
/// Returns the ids of badges awarded by this call.
#[instrument(skip(db), fields(user_id = %user_id))]
pub async fn check_and_award(db: &Database, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
    let Some(user) = db.get_user(user_id).await? else {
        return Ok(Vec::new());
    };

    let stats = gather_stats(db, &user).await?;
    let badges = db.list_badges(None, None).await?;

    let mut awarded = Vec::new();
    for badge in badges {
        let Some(criteria) = BadgeCriteria::parse(&badge.criteria) else {
            warn!(badge_id = %badge.id, "Badge has unparseable criteria, skipping");
            continue;
        };
        if !criteria.is_met(&stats) {
            continue;
        }
        if !db.award_badge(user.id, badge.id).await? {
            continue;
        }

        record_badge_awarded(&badge.name);
        db.create_notification(&CreateNotification::badge_earned(
            user.id,
            &badge.name,
            badge.id,
        ))
        .await?;
        record_notification_emitted("badge_earned");
        awarded.push(badge.id);
    }

    Ok(awarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats() -> UserStats {
        UserStats {
            answers_posted: 10,
            accepted_answers: 2,
            questions_posted: 3,
            reputation: 150,
            upvotes_received: 25,
            days_since_join: 400,
        }
    }

    #[test]
    fn parses_each_criteria_type() {
        assert_eq!(
            BadgeCriteria::parse(&json!({"type": "answers_posted", "threshold": 1})),
            Some(BadgeCriteria::AnswersPosted { threshold: 1 })
        );
        assert_eq!(
            BadgeCriteria::parse(&json!({"type": "join_date", "threshold_days": 365})),
            Some(BadgeCriteria::JoinDate { threshold_days: 365 })
        );
        assert_eq!(BadgeCriteria::parse(&json!({"type": "unknown"})), None);
        assert_eq!(BadgeCriteria::parse(&json!({})), None);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let s = stats();
        assert!(BadgeCriteria::AnswersPosted { threshold: 10 }.is_met(&s));
        assert!(!BadgeCriteria::AnswersPosted { threshold: 11 }.is_met(&s));
        assert!(BadgeCriteria::Reputation { threshold: 100 }.is_met(&s));
        assert!(BadgeCriteria::AcceptedAnswers { threshold: 2 }.is_met(&s));
        assert!(!BadgeCriteria::AcceptedAnswers { threshold: 3 }.is_met(&s));
        assert!(BadgeCriteria::UpvotesReceived { threshold: 25 }.is_met(&s));
        assert!(BadgeCriteria::JoinDate { threshold_days: 365 }.is_met(&s));
        assert!(!BadgeCriteria::QuestionsPosted { threshold: 5 }.is_met(&s));
    }
}
