//! Vote queries.
//!
//! Casting a vote is a toggle: a first vote inserts, a repeated identical
//! vote changes nothing, and an opposite vote flips the stored row. Every
//! mutation adjusts the content author's reputation in the same
//! transaction, clamped at zero by the schema and by GREATEST here so the
//! update never trips the check constraint.

use super::Database;
use crate::models::{AnswerVote, QuestionVote, VoteOutcome, VoteValue};
use crate::services::metrics::DB_QUERY_DURATION;
use serde::Serialize;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

/// Aggregate counts for one question or answer.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
    pub score: i64,
}

/// One voter's entry, listed alongside the tally.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct VoterEntry {
    pub user_id: Uuid,
    pub vote_value: i32,
}

impl Database {
    /// Cast or toggle a vote on a question. The caller has already checked
    /// that the voter is not the question author.
    #[instrument(skip(self))]
    pub async fn vote_question(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        author_id: Uuid,
        value: VoteValue,
    ) -> Result<VoteOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["vote_question"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, QuestionVote>(
            r#"
            SELECT id, user_id, question_id, vote_value, created_at
            FROM question_votes
            WHERE user_id = $1 AND question_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to read vote: {}", e)))?;

        let outcome = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO question_votes (user_id, question_id, vote_value)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(user_id)
                .bind(question_id)
                .bind(value.as_i32())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to insert vote: {}", e))
                })?;

                adjust_reputation(&mut tx, author_id, value.question_reputation_delta()).await?;
                VoteOutcome::Created
            }
            Some(vote) if vote.vote_value == value.as_i32() => VoteOutcome::Unchanged,
            Some(vote) => {
                sqlx::query("UPDATE question_votes SET vote_value = $2 WHERE id = $1")
                    .bind(vote.id)
                    .bind(value.as_i32())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to flip vote: {}", e))
                    })?;

                let previous = VoteValue::from_i32(vote.vote_value).ok_or_else(|| {
                    AppError::DatabaseError(anyhow::anyhow!("Corrupt vote value in storage"))
                })?;
                let delta =
                    value.question_reputation_delta() - previous.question_reputation_delta();
                adjust_reputation(&mut tx, author_id, delta).await?;
                VoteOutcome::Flipped
            }
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(%question_id, vote = value.as_str(), ?outcome, "Question vote applied");

        Ok(outcome)
    }

    /// Cast or toggle a vote on an answer.
    #[instrument(skip(self))]
    pub async fn vote_answer(
        &self,
        user_id: Uuid,
        answer_id: Uuid,
        author_id: Uuid,
        value: VoteValue,
    ) -> Result<VoteOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["vote_answer"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, AnswerVote>(
            r#"
            SELECT id, user_id, answer_id, vote_value, created_at
            FROM answer_votes
            WHERE user_id = $1 AND answer_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to read vote: {}", e)))?;

        let outcome = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO answer_votes (user_id, answer_id, vote_value)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(user_id)
                .bind(answer_id)
                .bind(value.as_i32())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to insert vote: {}", e))
                })?;

                adjust_reputation(&mut tx, author_id, value.answer_reputation_delta()).await?;
                VoteOutcome::Created
            }
            Some(vote) if vote.vote_value == value.as_i32() => VoteOutcome::Unchanged,
            Some(vote) => {
                sqlx::query("UPDATE answer_votes SET vote_value = $2 WHERE id = $1")
                    .bind(vote.id)
                    .bind(value.as_i32())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to flip vote: {}", e))
                    })?;

                let previous = VoteValue::from_i32(vote.vote_value).ok_or_else(|| {
                    AppError::DatabaseError(anyhow::anyhow!("Corrupt vote value in storage"))
                })?;
                let delta = value.answer_reputation_delta() - previous.answer_reputation_delta();
                adjust_reputation(&mut tx, author_id, delta).await?;
                VoteOutcome::Flipped
            }
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(%answer_id, vote = value.as_str(), ?outcome, "Answer vote applied");

        Ok(outcome)
    }

    /// Remove the caller's vote on a question and reverse its reputation
    /// effect. Returns false when there was no vote to retract.
    #[instrument(skip(self))]
    pub async fn retract_question_vote(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let removed: Option<(i32,)> = sqlx::query_as(
            r#"
            DELETE FROM question_votes
            WHERE user_id = $1 AND question_id = $2
            RETURNING vote_value
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to retract vote: {}", e)))?;

        let Some((stored,)) = removed else {
            return Ok(false);
        };

        let previous = VoteValue::from_i32(stored).ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("Corrupt vote value in storage"))
        })?;
        adjust_reputation(&mut tx, author_id, -previous.question_reputation_delta()).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        Ok(true)
    }

    /// Remove the caller's vote on an answer and reverse its reputation
    /// effect.
    #[instrument(skip(self))]
    pub async fn retract_answer_vote(
        &self,
        user_id: Uuid,
        answer_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let removed: Option<(i32,)> = sqlx::query_as(
            r#"
            DELETE FROM answer_votes
            WHERE user_id = $1 AND answer_id = $2
            RETURNING vote_value
            "#,
        )
        .bind(user_id)
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to retract vote: {}", e)))?;

        let Some((stored,)) = removed else {
            return Ok(false);
        };

        let previous = VoteValue::from_i32(stored).ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("Corrupt vote value in storage"))
        })?;
        adjust_reputation(&mut tx, author_id, -previous.answer_reputation_delta()).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn question_vote_tally(&self, question_id: Uuid) -> Result<VoteTally, AppError> {
        let tally = sqlx::query_as::<_, VoteTally>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE vote_value = 1) AS upvotes,
                COUNT(*) FILTER (WHERE vote_value = -1) AS downvotes,
                COALESCE(SUM(vote_value), 0) AS score
            FROM question_votes WHERE question_id = $1
            "#,
        )
        .bind(question_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to tally votes: {}", e)))?;

        Ok(tally)
    }

    #[instrument(skip(self))]
    pub async fn answer_vote_tally(&self, answer_id: Uuid) -> Result<VoteTally, AppError> {
        let tally = sqlx::query_as::<_, VoteTally>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE vote_value = 1) AS upvotes,
                COUNT(*) FILTER (WHERE vote_value = -1) AS downvotes,
                COALESCE(SUM(vote_value), 0) AS score
            FROM answer_votes WHERE answer_id = $1
            "#,
        )
        .bind(answer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to tally votes: {}", e)))?;

        Ok(tally)
    }

    /// Who voted on a question and which way, newest first.
    #[instrument(skip(self))]
    pub async fn question_voters(&self, question_id: Uuid) -> Result<Vec<VoterEntry>, AppError> {
        sqlx::query_as::<_, VoterEntry>(
            "SELECT user_id, vote_value FROM question_votes WHERE question_id = $1 ORDER BY created_at DESC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list voters: {}", e)))
    }

    #[instrument(skip(self))]
    pub async fn answer_voters(&self, answer_id: Uuid) -> Result<Vec<VoterEntry>, AppError> {
        sqlx::query_as::<_, VoterEntry>(
            "SELECT user_id, vote_value FROM answer_votes WHERE answer_id = $1 ORDER BY created_at DESC",
        )
        .bind(answer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list voters: {}", e)))
    }

    /// The caller's own vote on a question, if any.
    #[instrument(skip(self))]
    pub async fn get_question_vote(
        &self,
        user_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<QuestionVote>, AppError> {
        let vote = sqlx::query_as::<_, QuestionVote>(
            r#"
            SELECT id, user_id, question_id, vote_value, created_at
            FROM question_votes
            WHERE user_id = $1 AND question_id = $2
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get vote: {}", e)))?;

        Ok(vote)
    }

    /// The caller's own vote on an answer, if any.
    #[instrument(skip(self))]
    pub async fn get_answer_vote(
        &self,
        user_id: Uuid,
        answer_id: Uuid,
    ) -> Result<Option<AnswerVote>, AppError> {
        let vote = sqlx::query_as::<_, AnswerVote>(
            r#"
            SELECT id, user_id, answer_id, vote_value, created_at
            FROM answer_votes
            WHERE user_id = $1 AND answer_id = $2
            "#,
        )
        .bind(user_id)
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get vote: {}", e)))?;

        Ok(vote)
    }

    /// Upvotes this user's content has received, used by badge criteria.
    #[instrument(skip(self))]
    pub async fn count_upvotes_received(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM question_votes qv
                 JOIN questions q ON q.id = qv.question_id
                 WHERE q.author_id = $1 AND qv.vote_value = 1)
                +
                (SELECT COUNT(*) FROM answer_votes av
                 JOIN answers a ON a.id = av.answer_id
                 WHERE a.author_id = $1 AND av.vote_value = 1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count upvotes: {}", e)))?;

        Ok(count.0)
    }
}

/// Clamp at zero so a downvote-heavy author can never trip the schema's
/// non-negative check.
async fn adjust_reputation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    delta: i32,
) -> Result<(), AppError> {
    if delta == 0 {
        return Ok(());
    }
    sqlx::query("UPDATE users SET reputation = GREATEST(reputation + $2, 0) WHERE id = $1")
        .bind(user_id)
        .bind(delta)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to adjust reputation: {}", e))
        })?;
    Ok(())
}
