//! The Authority's own tie-break rule.

use crate::ports::tie_breaker::TieBreakResolver;
use async_trait::async_trait;
use hive_domain::{RoundSnapshot, VoteOption};
use tracing::debug;

/// Breaks ties in favour of the option backed by the most distinct voters.
///
/// Equal tallies with unequal head-counts mean a broader base of support for
/// one option; when head-counts are equal too, the resolver abstains and the
/// engine's first-listed rule decides.
pub struct QueenTieBreaker;

#[async_trait]
impl TieBreakResolver for QueenTieBreaker {
    async fn resolve_tie(&self, round: &RoundSnapshot, tied: &[VoteOption]) -> Option<String> {
        let counts: Vec<(&str, usize)> = tied
            .iter()
            .map(|option| {
                let voters = round
                    .votes
                    .iter()
                    .filter(|v| v.option_id == option.id)
                    .count();
                (option.id.as_str(), voters)
            })
            .collect();

        let max = counts.iter().map(|(_, n)| *n).max()?;
        let mut leaders = counts.iter().filter(|(_, n)| *n == max);
        let (first, _) = leaders.next()?;
        if leaders.next().is_some() {
            debug!("Tie in {} is also even by head-count, abstaining", round.id);
            return None;
        }
        Some(first.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hive_domain::{AgentId, Ballot, Participation, RoundId, RoundState, Vote};

    fn snapshot(votes: &[(&str, &str, f64)]) -> RoundSnapshot {
        RoundSnapshot {
            id: RoundId::new("round-1"),
            topic_id: "t".to_string(),
            question: "q".to_string(),
            state: RoundState::Closing,
            eligible_voters: votes.iter().map(|(a, _, _)| AgentId::new(*a)).collect(),
            votes: votes
                .iter()
                .map(|(a, o, c)| Vote::from_ballot(Ballot::new(*a, *o, *c), 1.0))
                .collect(),
            participation: Participation::new(votes.len(), votes.len()),
            opened_at: Utc::now(),
            deadline: Utc::now(),
        }
    }

    fn tied() -> Vec<VoteOption> {
        vec![
            VoteOption::labeled("email", "Email"),
            VoteOption::labeled("social", "Social"),
        ]
    }

    #[tokio::test]
    async fn test_prefers_broader_support() {
        // 1.0 == 0.5 + 0.5, but social has two backers
        let round = snapshot(&[("a", "email", 1.0), ("b", "social", 0.5), ("c", "social", 0.5)]);
        let choice = QueenTieBreaker.resolve_tie(&round, &tied()).await;
        assert_eq!(choice.as_deref(), Some("social"));
    }

    #[tokio::test]
    async fn test_abstains_on_even_head_count() {
        let round = snapshot(&[("a", "email", 0.7), ("b", "social", 0.7)]);
        assert_eq!(QueenTieBreaker.resolve_tie(&round, &tied()).await, None);
    }
}
