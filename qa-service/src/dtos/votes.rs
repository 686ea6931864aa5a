use crate::models::{VoteOutcome, VoteValue};
use crate::services::database::VoteTally;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote: VoteValue,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    /// What the request did: "created", "unchanged", or "flipped".
    pub outcome: &'static str,
    /// The caller's vote after the request, if any.
    pub my_vote: Option<&'static str>,
    #[serde(flatten)]
    pub tally: VoteTally,
}

impl VoteResponse {
    pub fn new(outcome: VoteOutcome, my_vote: Option<VoteValue>, tally: VoteTally) -> Self {
        let outcome = match outcome {
            VoteOutcome::Created => "created",
            VoteOutcome::Unchanged => "unchanged",
            VoteOutcome::Flipped => "flipped",
        };
        Self {
            outcome,
            my_vote: my_vote.map(VoteValue::as_str),
            tally,
        }
    }
}
