//! Tie-break resolver port
//!
//! When a round closes with two or more options sharing the maximum tally,
//! the Voting Engine asks the resolver for a choice and waits at most the
//! configured grace period. A missing or invalid answer falls back to the
//! first tied option in ballot order.

use async_trait::async_trait;
use hive_domain::{RoundSnapshot, VoteOption};

#[async_trait]
pub trait TieBreakResolver: Send + Sync {
    /// Pick one of `tied` by id, or `None` to abstain.
    async fn resolve_tie(&self, round: &RoundSnapshot, tied: &[VoteOption]) -> Option<String>;
}
