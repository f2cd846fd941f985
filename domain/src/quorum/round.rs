//! Voting round state machine
//!
//! ```text
//!            cast (last vote wins)
//!              ┌──────┐
//!              ▼      │
//!   open ──▶ [Open] ──┘
//!              │ seal
//!              ▼
//!          [Closing] ──complete──▶ [Closed]   (quorum met, winner chosen)
//!                      └─────────▶ [Deferred] (quorum not met)
//! ```
//!
//! `Closing` is transient: it exists while a tie is being resolved, and
//! rejects votes exactly like the terminal states. A round reaches exactly
//! one terminal state and never re-opens.
//!
//! The round itself is synchronous and single-owner; the voting engine
//! serializes access to it.

use super::rule::QuorumThreshold;
use super::tally::{MajorityResult, Participation, Tally, TieBreakRecord, TieResolution};
use super::topic::{RoundId, VoteOption, VotingTopic};
use super::vote::{Ballot, Vote};
use crate::agent::AgentId;
use crate::core::error::VotingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

/// Standing weight for agents without an entry in the weight table.
pub const DEFAULT_AGENT_WEIGHT: f64 = 1.0;

/// Lifecycle state of a voting round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundState {
    /// Accepting votes
    Open,
    /// Sealed for tallying; votes are rejected
    Closing,
    /// Closed with a winner
    Closed,
    /// Closed without a winner because quorum was not met
    Deferred,
}

impl RoundState {
    pub fn is_open(&self) -> bool {
        matches!(self, RoundState::Open)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundState::Closed | RoundState::Deferred)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundState::Open => "OPEN",
            RoundState::Closing => "CLOSING",
            RoundState::Closed => "CLOSED",
            RoundState::Deferred => "DEFERRED",
        }
    }
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RoundOutcome {
    /// Quorum met; a winner was chosen
    Closed(MajorityResult),
    /// Quorum not met; no winner. The decision must be re-queued.
    Deferred(Participation),
}

impl RoundOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, RoundOutcome::Deferred(_))
    }

    pub fn result(&self) -> Option<&MajorityResult> {
        match self {
            RoundOutcome::Closed(result) => Some(result),
            RoundOutcome::Deferred(_) => None,
        }
    }

    pub fn participation(&self) -> Participation {
        match self {
            RoundOutcome::Closed(result) => result.participation,
            RoundOutcome::Deferred(participation) => *participation,
        }
    }

    pub fn state(&self) -> RoundState {
        match self {
            RoundOutcome::Closed(_) => RoundState::Closed,
            RoundOutcome::Deferred(_) => RoundState::Deferred,
        }
    }
}

/// What happened to an accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastReceipt {
    /// The agent had already voted; its earlier vote was replaced
    pub replaced: bool,
    /// Every eligible voter has now voted
    pub all_voted: bool,
}

/// A sealed round, ready to be completed.
#[derive(Debug, Clone, PartialEq)]
pub enum SealedRound {
    /// Participation fell below the quorum threshold
    BelowQuorum(Participation),
    /// Votes were tallied; a tie may still need resolving
    Tallied(Tally),
}

impl SealedRound {
    /// Tied options awaiting a tie-break, if any.
    pub fn tied_options(&self) -> Option<&[String]> {
        match self {
            SealedRound::Tallied(tally) if tally.is_tie() => Some(&tally.leaders),
            _ => None,
        }
    }
}

/// Read-only view of a round, safe to hand out at any state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub id: RoundId,
    pub topic_id: String,
    pub question: String,
    pub state: RoundState,
    pub eligible_voters: Vec<AgentId>,
    pub votes: Vec<Vote>,
    pub participation: Participation,
    pub opened_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// One bounded instance of soliciting and tallying votes on a topic.
#[derive(Debug, Clone)]
pub struct VotingRound {
    id: RoundId,
    topic: VotingTopic,
    eligible_voters: BTreeSet<AgentId>,
    /// Standing weights snapshotted when the round opened
    weights: HashMap<AgentId, f64>,
    votes: BTreeMap<AgentId, Vote>,
    state: RoundState,
    quorum: QuorumThreshold,
    opened_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
}

impl VotingRound {
    /// Open a round. Fails with `InvalidTopic` when the topic has no options
    /// or nobody is eligible to vote.
    pub fn open(
        id: RoundId,
        topic: VotingTopic,
        eligible_voters: impl IntoIterator<Item = AgentId>,
        weights: HashMap<AgentId, f64>,
        quorum: QuorumThreshold,
        timeout: Duration,
    ) -> Result<Self, VotingError> {
        topic.validate()?;

        let eligible_voters: BTreeSet<AgentId> = eligible_voters.into_iter().collect();
        if eligible_voters.is_empty() {
            return Err(VotingError::InvalidTopic(format!(
                "topic '{}' has no eligible voters",
                topic.id
            )));
        }

        let opened_at = Utc::now();
        let deadline = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|d| opened_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Ok(Self {
            id,
            topic,
            eligible_voters,
            weights,
            votes: BTreeMap::new(),
            state: RoundState::Open,
            quorum,
            opened_at,
            deadline,
        })
    }

    pub fn id(&self) -> &RoundId {
        &self.id
    }

    pub fn topic(&self) -> &VotingTopic {
        &self.topic
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn is_eligible(&self, agent: &AgentId) -> bool {
        self.eligible_voters.contains(agent)
    }

    /// Weight applied to `agent`'s votes in this round.
    pub fn standing_weight(&self, agent: &AgentId) -> f64 {
        self.weights
            .get(agent)
            .copied()
            .unwrap_or(DEFAULT_AGENT_WEIGHT)
    }

    pub fn vote_of(&self, agent: &AgentId) -> Option<&Vote> {
        self.votes.get(agent)
    }

    pub fn participation(&self) -> Participation {
        Participation::new(self.eligible_voters.len(), self.votes.len())
    }

    pub fn all_voted(&self) -> bool {
        self.votes.len() == self.eligible_voters.len()
    }

    /// Accept a ballot. A later ballot from the same agent replaces the
    /// earlier one.
    pub fn cast(&mut self, ballot: Ballot) -> Result<CastReceipt, VotingError> {
        if !self.state.is_open() {
            return Err(VotingError::RoundClosed(self.id.clone()));
        }
        if !self.is_eligible(&ballot.agent_id) {
            return Err(VotingError::VoterNotEligible {
                round: self.id.clone(),
                agent: ballot.agent_id,
            });
        }
        if self.topic.option(&ballot.option_id).is_none() {
            return Err(VotingError::UnknownOption {
                round: self.id.clone(),
                option: ballot.option_id,
            });
        }

        let weight = self.standing_weight(&ballot.agent_id);
        let vote = Vote::from_ballot(ballot, weight);
        let replaced = self.votes.insert(vote.agent_id.clone(), vote).is_some();

        Ok(CastReceipt {
            replaced,
            all_voted: self.all_voted(),
        })
    }

    /// Stop accepting votes and tally what was cast.
    ///
    /// The quorum check precedes tallying.
    pub fn seal(&mut self) -> Result<SealedRound, VotingError> {
        if !self.state.is_open() {
            return Err(VotingError::RoundClosed(self.id.clone()));
        }
        self.state = RoundState::Closing;

        let participation = self.participation();
        if !self
            .quorum
            .is_satisfied(participation.actual_voters, participation.eligible_voters)
        {
            return Ok(SealedRound::BelowQuorum(participation));
        }

        Ok(SealedRound::Tallied(Tally::compute(
            &self.topic,
            self.votes.values(),
        )))
    }

    /// Move a sealed round to its terminal state.
    ///
    /// `tie_choice` is the authority's pick among tied options. It is ignored
    /// when there is no tie, and replaced by the first-listed tied option
    /// when absent or not one of the tied options.
    pub fn complete(
        &mut self,
        sealed: SealedRound,
        tie_choice: Option<&str>,
    ) -> Result<RoundOutcome, VotingError> {
        if self.state != RoundState::Closing {
            return Err(VotingError::RoundClosed(self.id.clone()));
        }

        let tally = match sealed {
            SealedRound::BelowQuorum(participation) => {
                self.state = RoundState::Deferred;
                return Ok(RoundOutcome::Deferred(participation));
            }
            SealedRound::Tallied(tally) => tally,
        };

        let (winner_id, tie) = if tally.is_tie() {
            let (chosen, resolution) = match tie_choice {
                Some(choice) if tally.leaders.iter().any(|l| l == choice) => {
                    (choice.to_string(), TieResolution::Authority)
                }
                _ => (
                    tally.first_listed_leader().unwrap_or_default().to_string(),
                    TieResolution::DeterministicFirst,
                ),
            };
            let record = TieBreakRecord {
                tied_options: tally.leaders.clone(),
                chosen: chosen.clone(),
                resolution,
            };
            (chosen, Some(record))
        } else {
            (
                tally.clear_winner().unwrap_or_default().to_string(),
                None,
            )
        };

        let winner = self.option_or_first(&winner_id);
        self.state = RoundState::Closed;

        Ok(RoundOutcome::Closed(MajorityResult {
            round_id: self.id.clone(),
            winner,
            voting_stats: tally.stats,
            participation: self.participation(),
            votes: self.votes.values().cloned().collect(),
            tie,
        }))
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            id: self.id.clone(),
            topic_id: self.topic.id.clone(),
            question: self.topic.question.clone(),
            state: self.state,
            eligible_voters: self.eligible_voters.iter().cloned().collect(),
            votes: self.votes.values().cloned().collect(),
            participation: self.participation(),
            opened_at: self.opened_at,
            deadline: self.deadline,
        }
    }

    fn option_or_first(&self, option_id: &str) -> VoteOption {
        // validate() guarantees at least one option
        self.topic
            .option(option_id)
            .or_else(|| self.topic.options.first())
            .cloned()
            .unwrap_or_else(|| VoteOption::labeled(option_id, option_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quorum::topic::TopicKind;

    fn topic(options: &[&str]) -> VotingTopic {
        VotingTopic::new(
            "topic",
            TopicKind::Decision,
            "Which way?",
            options
                .iter()
                .map(|id| VoteOption::labeled(*id, *id))
                .collect(),
        )
    }

    fn agents(ids: &[&str]) -> Vec<AgentId> {
        ids.iter().map(|id| AgentId::new(*id)).collect()
    }

    fn open(options: &[&str], voters: &[&str]) -> VotingRound {
        VotingRound::open(
            RoundId::new("round-1"),
            topic(options),
            agents(voters),
            HashMap::new(),
            QuorumThreshold::default(),
            Duration::from_secs(30),
        )
        .unwrap()
    }

    fn close(round: &mut VotingRound) -> RoundOutcome {
        let sealed = round.seal().unwrap();
        round.complete(sealed, None).unwrap()
    }

    #[test]
    fn test_open_rejects_empty_voters() {
        let err = VotingRound::open(
            RoundId::new("r"),
            topic(&["a"]),
            Vec::new(),
            HashMap::new(),
            QuorumThreshold::default(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, VotingError::InvalidTopic(_)));
    }

    #[test]
    fn test_open_rejects_empty_options() {
        let err = VotingRound::open(
            RoundId::new("r"),
            topic(&[]),
            agents(&["x"]),
            HashMap::new(),
            QuorumThreshold::default(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, VotingError::InvalidTopic(_)));
    }

    #[test]
    fn test_last_vote_wins() {
        let mut round = open(&["a", "b"], &["x", "y"]);
        let first = round.cast(Ballot::new("x", "a", 0.9)).unwrap();
        assert!(!first.replaced);
        assert!(!first.all_voted);

        let second = round.cast(Ballot::new("x", "b", 0.4)).unwrap();
        assert!(second.replaced);
        assert_eq!(round.participation().actual_voters, 1);
        assert_eq!(round.vote_of(&AgentId::new("x")).unwrap().option_id, "b");
    }

    #[test]
    fn test_cast_rejections() {
        let mut round = open(&["a"], &["x"]);
        assert!(matches!(
            round.cast(Ballot::new("z", "a", 0.5)),
            Err(VotingError::VoterNotEligible { .. })
        ));
        assert!(matches!(
            round.cast(Ballot::new("x", "nope", 0.5)),
            Err(VotingError::UnknownOption { .. })
        ));

        round.cast(Ballot::new("x", "a", 0.5)).unwrap();
        close(&mut round);
        assert!(matches!(
            round.cast(Ballot::new("x", "a", 0.5)),
            Err(VotingError::RoundClosed(_))
        ));
    }

    #[test]
    fn test_all_voted_receipt() {
        let mut round = open(&["a"], &["x", "y"]);
        round.cast(Ballot::new("x", "a", 0.5)).unwrap();
        let receipt = round.cast(Ballot::new("y", "a", 0.5)).unwrap();
        assert!(receipt.all_voted);
    }

    #[test]
    fn test_close_with_winner() {
        let mut round = open(&["a", "b"], &["x", "y", "z"]);
        round.cast(Ballot::new("x", "a", 0.9)).unwrap();
        round.cast(Ballot::new("y", "b", 0.6)).unwrap();
        round.cast(Ballot::new("z", "a", 0.3)).unwrap();

        let outcome = close(&mut round);
        let result = outcome.result().unwrap();
        assert_eq!(result.winner.id, "a");
        assert!((result.winner_tally() - 1.2).abs() < 1e-9);
        assert_eq!(result.participation.actual_voters, 3);
        assert_eq!(round.state(), RoundState::Closed);
        assert!(result.tie.is_none());
    }

    #[test]
    fn test_below_quorum_defers() {
        let mut round = open(&["a"], &["u", "v", "w", "x", "y", "z"]);
        round.cast(Ballot::new("u", "a", 0.9)).unwrap();
        round.cast(Ballot::new("v", "a", 0.9)).unwrap();

        let outcome = close(&mut round);
        assert!(outcome.is_deferred());
        assert!(outcome.result().is_none());
        assert_eq!(round.state(), RoundState::Deferred);
        assert_eq!(outcome.participation().actual_voters, 2);
    }

    #[test]
    fn test_tie_falls_back_to_first_listed() {
        let mut round = open(&["first", "second"], &["w", "x", "y", "z"]);
        round.cast(Ballot::new("w", "second", 1.0)).unwrap();
        round.cast(Ballot::new("x", "second", 1.0)).unwrap();
        round.cast(Ballot::new("y", "first", 1.0)).unwrap();
        round.cast(Ballot::new("z", "first", 1.0)).unwrap();

        let sealed = round.seal().unwrap();
        assert_eq!(sealed.tied_options().map(|t| t.len()), Some(2));

        let outcome = round.complete(sealed, Some("not-tied")).unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.winner.id, "first");
        let tie = result.tie.as_ref().unwrap();
        assert_eq!(tie.resolution, TieResolution::DeterministicFirst);
        assert_eq!(tie.tied_options, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_tie_resolved_by_authority_choice() {
        let mut round = open(&["first", "second"], &["x", "y"]);
        round.cast(Ballot::new("x", "first", 0.5)).unwrap();
        round.cast(Ballot::new("y", "second", 0.5)).unwrap();

        let sealed = round.seal().unwrap();
        let outcome = round.complete(sealed, Some("second")).unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.winner.id, "second");
        assert_eq!(result.tie.as_ref().unwrap().resolution, TieResolution::Authority);
    }

    #[test]
    fn test_standing_weights_snapshot() {
        let mut weights = HashMap::new();
        weights.insert(AgentId::new("x"), 0.9);
        let mut round = VotingRound::open(
            RoundId::new("r"),
            topic(&["a"]),
            agents(&["x"]),
            weights,
            QuorumThreshold::default(),
            Duration::from_secs(5),
        )
        .unwrap();

        round.cast(Ballot::new("x", "a", 0.8)).unwrap();
        let outcome = close(&mut round);
        assert!((outcome.result().unwrap().winner_tally() - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_seal_twice_is_rejected() {
        let mut round = open(&["a"], &["x"]);
        round.cast(Ballot::new("x", "a", 1.0)).unwrap();
        round.seal().unwrap();
        assert!(matches!(round.seal(), Err(VotingError::RoundClosed(_))));
        assert_eq!(round.snapshot().state, RoundState::Closing);
    }
}
