//! Domain layer for hive-quorum
//!
//! This crate contains the core business logic, entities, and value objects
//! of the decision-consensus subsystem. It has no dependencies on an async
//! runtime, infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Voting round
//!
//! One bounded instance of soliciting and tallying weighted votes on a
//! single topic. See [`quorum`].
//!
//! ## Decision record
//!
//! The append-only outcome of a decision cycle, mined for per-agent success
//! rates that feed back into future vote weights. See [`decision`].

pub mod agent;
pub mod core;
pub mod decision;
pub mod quorum;

// Re-export commonly used types
pub use agent::{AgentId, AgentReport, AgentStatus, AssignmentRole, TaskAssignment};
pub use self::core::{
    error::VotingError,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use decision::{
    AgentPattern, DecisionRecord, DecisionStatus, DecisionType, EmergencySeverity, Urgency,
    analyze_decision_patterns,
};
pub use quorum::{
    Ballot, MajorityResult, Participation, QuorumThreshold, Recommendation, RoundId, RoundOutcome,
    RoundSnapshot, RoundState, TieBreakRecord, TieBreakerPolicy, TieResolution, TopicContext,
    TopicKind, Vote, VoteOption, VotingRound, VotingStats, VotingTopic,
};
