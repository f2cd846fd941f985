//! Weighted quorum voting domain
//!
//! This module contains the pure (runtime-free) parts of a voting round.
//!
//! # Core Concepts
//!
//! ## Weighted vote
//! A vote's influence is its stated confidence multiplied by the voter's
//! standing weight, snapshotted when the round opens.
//!
//! ## Quorum
//! The minimum fraction of eligible voters that must take part for a round
//! to close with a winner. Below it, the round is *deferred*.
//!
//! ## Tie-break
//! Two or more options sharing the maximum tally are a tie. The tally never
//! resolves ties on its own: the authority may pick one of the tied options,
//! otherwise the option listed first in the topic wins.
//!
//! # Flow
//!
//! ```text
//! VotingTopic ──open──▶ VotingRound ◀──cast── Ballot
//!                           │
//!                         seal ──▶ BelowQuorum ──▶ RoundOutcome::Deferred
//!                           │
//!                           └────▶ Tally ──(tie?)──▶ RoundOutcome::Closed(MajorityResult)
//! ```

pub mod recommendation;
pub mod round;
pub mod rule;
pub mod tally;
pub mod topic;
pub mod vote;

// Re-export main types
pub use recommendation::Recommendation;
pub use round::{
    CastReceipt, DEFAULT_AGENT_WEIGHT, RoundOutcome, RoundSnapshot, RoundState, SealedRound,
    VotingRound,
};
pub use rule::{QuorumThreshold, TieBreakerPolicy};
pub use tally::{
    MajorityResult, OptionTally, Participation, Tally, TieBreakRecord, TieResolution, VotingStats,
};
pub use topic::{RoundId, TopicContext, TopicKind, VoteOption, VotingTopic};
pub use vote::{Ballot, Vote};
