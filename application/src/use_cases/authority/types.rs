//! Types for the Coordinating Authority

use crate::ports::decision_memory::{MemoryError, MemoryHealth};
use chrono::{DateTime, Utc};
use hive_domain::{
    AgentId, AgentReport, DecisionType, EmergencySeverity, Participation, TopicContext, Urgency,
    VotingError,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that abort a single decision cycle.
///
/// The Authority itself and other in-flight rounds are unaffected.
#[derive(Error, Debug)]
pub enum AuthorityError {
    #[error("No agents registered")]
    NoAgentsRegistered,

    #[error("No reports collected for '{0}'")]
    NoReportsCollected(String),

    #[error("Unknown deferred decision: {0}")]
    UnknownDeferred(String),

    #[error("Voting error: {0}")]
    Voting(#[from] VotingError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

/// A decision whose round closed without quorum, waiting to be retried.
#[derive(Debug, Clone, Serialize)]
pub struct DeferredDecision {
    /// Id of the deferred (unpersisted) record
    pub id: String,
    pub decision_type: DecisionType,
    pub topic: String,
    pub context: TopicContext,
    pub urgency: Urgency,
    /// Set for emergency decisions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<EmergencySeverity>,
    pub participation: Participation,
    pub deferred_at: DateTime<Utc>,
}

/// Overall health classification of the swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Critical,
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthLevel::Healthy => write!(f, "healthy"),
            HealthLevel::Degraded => write!(f, "degraded"),
            HealthLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Point-in-time health report of the agent registry and its collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct SwarmHealth {
    pub total_agents: usize,
    /// Agents able to take on work right now
    pub available_agents: usize,
    /// Agent count per status name
    pub status_counts: BTreeMap<String, usize>,
    /// Voting rounds still open
    pub active_rounds: usize,
    /// Decisions waiting in the re-queue
    pub deferred_decisions: usize,
    pub memory: MemoryHealth,
    pub overall: HealthLevel,
}

/// Result of a collaboration request across a set of agents.
#[derive(Debug, Clone, Serialize)]
pub struct CollaborationPlan {
    pub task: String,
    /// Reports ranked by confidence, highest first
    pub contributions: Vec<AgentReport>,
    /// Agent with the most confident contribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<AgentId>,
    /// Requested ids that are not registered
    pub missing: Vec<AgentId>,
    /// Registered agents that failed or timed out
    pub failed: Vec<AgentId>,
}

impl CollaborationPlan {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}
