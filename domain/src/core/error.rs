//! Domain error types

use crate::agent::AgentId;
use crate::quorum::RoundId;
use thiserror::Error;

/// Errors raised by voting round operations.
///
/// Every variant rejects the offending call; none of them leave a round in an
/// inconsistent state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VotingError {
    /// Malformed round request. Retrying with the same input fails again.
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Voting round not found: {0}")]
    RoundNotFound(RoundId),

    #[error("Agent {agent} is not eligible to vote in round {round}")]
    VoterNotEligible { round: RoundId, agent: AgentId },

    #[error("Voting round {0} is closed")]
    RoundClosed(RoundId),

    #[error("Option {option} is not part of round {round}")]
    UnknownOption { round: RoundId, option: String },
}

impl VotingError {
    /// Whether this error rejected a single vote (as opposed to a round request)
    pub fn is_vote_rejection(&self) -> bool {
        matches!(
            self,
            VotingError::RoundNotFound(_)
                | VotingError::VoterNotEligible { .. }
                | VotingError::RoundClosed(_)
                | VotingError::UnknownOption { .. }
        )
    }
}
