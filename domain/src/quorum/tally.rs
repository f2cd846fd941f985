//! Weighted tally and majority results
//!
//! For each option, `tally = Σ vote.confidence * vote.weight` over the votes
//! choosing it. The leaders are the options with the maximum tally; more than
//! one leader is a tie, which the tally itself never resolves.

use super::topic::{RoundId, VoteOption, VotingTopic};
use super::vote::Vote;
use serde::{Deserialize, Serialize};

/// Tallies closer than this are treated as equal.
pub const TIE_EPSILON: f64 = 1e-9;

/// Tally for a single option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTally {
    pub option_id: String,
    /// Sum of weighted confidence of the votes for this option
    pub tally: f64,
    /// Share of the total tally (0-100)
    pub percentage: f64,
    /// Number of distinct voters choosing this option
    pub voters: usize,
}

/// Aggregate vote statistics, options listed in topic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingStats {
    pub total_votes: usize,
    pub options: Vec<OptionTally>,
}

impl VotingStats {
    pub fn tally_for(&self, option_id: &str) -> f64 {
        self.get(option_id).map(|t| t.tally).unwrap_or(0.0)
    }

    pub fn percentage_for(&self, option_id: &str) -> f64 {
        self.get(option_id).map(|t| t.percentage).unwrap_or(0.0)
    }

    pub fn voters_for(&self, option_id: &str) -> usize {
        self.get(option_id).map(|t| t.voters).unwrap_or(0)
    }

    /// Sum of all option tallies.
    pub fn total_tally(&self) -> f64 {
        self.options.iter().map(|t| t.tally).sum()
    }

    fn get(&self, option_id: &str) -> Option<&OptionTally> {
        self.options.iter().find(|t| t.option_id == option_id)
    }
}

/// Who took part in a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub eligible_voters: usize,
    pub actual_voters: usize,
    /// `actual_voters / eligible_voters`
    pub participation_rate: f64,
}

impl Participation {
    pub fn new(eligible_voters: usize, actual_voters: usize) -> Self {
        let participation_rate = if eligible_voters == 0 {
            0.0
        } else {
            actual_voters as f64 / eligible_voters as f64
        };
        Self {
            eligible_voters,
            actual_voters,
            participation_rate,
        }
    }

    pub fn percentage(&self) -> f64 {
        self.participation_rate * 100.0
    }
}

/// How a tie was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieResolution {
    /// The coordinating authority chose among the tied options
    Authority,
    /// No valid choice arrived in time; the first-listed tied option won
    DeterministicFirst,
}

/// Audit entry recorded whenever a round closed on a tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieBreakRecord {
    /// Tied option ids, in topic order
    pub tied_options: Vec<String>,
    pub chosen: String,
    pub resolution: TieResolution,
}

/// Outcome of a round that closed with a winner. Produced once, at close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorityResult {
    pub round_id: RoundId,
    pub winner: VoteOption,
    pub voting_stats: VotingStats,
    pub participation: Participation,
    /// The counted votes, ordered by agent id
    pub votes: Vec<Vote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie: Option<TieBreakRecord>,
}

impl MajorityResult {
    /// Winner's share of the total tally (0-100).
    pub fn winner_percentage(&self) -> f64 {
        self.voting_stats.percentage_for(&self.winner.id)
    }

    pub fn winner_tally(&self) -> f64 {
        self.voting_stats.tally_for(&self.winner.id)
    }

    pub fn was_tied(&self) -> bool {
        self.tie.is_some()
    }

    /// Votes that chose the winner.
    pub fn supporting_votes(&self) -> impl Iterator<Item = &Vote> {
        self.votes.iter().filter(|v| v.option_id == self.winner.id)
    }

    /// Generate a visual vote summary (e.g., "[●●○]", ● = voted for the winner)
    pub fn vote_summary(&self) -> String {
        let mut summary = String::from("[");
        for vote in &self.votes {
            summary.push(if vote.option_id == self.winner.id {
                '●'
            } else {
                '○'
            });
        }
        summary.push(']');
        summary
    }
}

/// Raw tally before any tie-break.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub stats: VotingStats,
    /// Option ids sharing the maximum tally, in topic order
    pub leaders: Vec<String>,
}

impl Tally {
    /// Tally `votes` against the options of `topic`.
    ///
    /// Votes are summed in the order given; callers pass them in a stable
    /// order so repeated runs are bit-identical.
    pub fn compute<'a>(topic: &VotingTopic, votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        let mut options: Vec<OptionTally> = topic
            .options
            .iter()
            .map(|o| OptionTally {
                option_id: o.id.clone(),
                tally: 0.0,
                percentage: 0.0,
                voters: 0,
            })
            .collect();

        let mut total_votes = 0;
        for vote in votes {
            if let Some(slot) = options.iter_mut().find(|t| t.option_id == vote.option_id) {
                slot.tally += vote.weighted_confidence();
                slot.voters += 1;
                total_votes += 1;
            }
        }

        let total: f64 = options.iter().map(|t| t.tally).sum();
        if total > 0.0 {
            for slot in &mut options {
                slot.percentage = slot.tally / total * 100.0;
            }
        }

        let max = options.iter().map(|t| t.tally).fold(f64::MIN, f64::max);
        let leaders = options
            .iter()
            .filter(|t| (t.tally - max).abs() <= TIE_EPSILON)
            .map(|t| t.option_id.clone())
            .collect();

        Self {
            stats: VotingStats {
                total_votes,
                options,
            },
            leaders,
        }
    }

    pub fn is_tie(&self) -> bool {
        self.leaders.len() > 1
    }

    /// The unique leader, if there is no tie.
    pub fn clear_winner(&self) -> Option<&str> {
        match self.leaders.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// The deterministic fallback: first tied option in topic order.
    pub fn first_listed_leader(&self) -> Option<&str> {
        self.leaders.first().map(String::as_str)
    }
}
