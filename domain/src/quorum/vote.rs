//! Vote types for weighted consensus
//!
//! A [`Ballot`] is what a caller submits; a [`Vote`] is what a round records
//! once the voter's standing weight has been applied.

use crate::agent::AgentId;
use crate::agent::value_objects::clamp_unit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vote as submitted to a round.
///
/// # Example
///
/// ```
/// use hive_domain::quorum::Ballot;
///
/// let ballot = Ballot::new("analyst", "automate-follow-ups", 0.85)
///     .with_reasoning("Follow-ups are the main conversion bottleneck");
/// assert_eq!(ballot.confidence, 0.85);
/// assert_eq!(ballot.weight_multiplier, 1.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ballot {
    pub agent_id: AgentId,
    pub option_id: String,
    /// Confidence level (0.0 to 1.0)
    pub confidence: f64,
    pub reasoning: String,
    /// Scales the voter's standing weight for this ballot only
    pub weight_multiplier: f64,
}

impl Ballot {
    pub fn new(agent_id: impl Into<AgentId>, option_id: impl Into<String>, confidence: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            option_id: option_id.into(),
            confidence: clamp_unit(confidence),
            reasoning: String::new(),
            weight_multiplier: 1.0,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Elevate (or reduce) this ballot's influence. Negative or non-finite
    /// multipliers count as zero.
    pub fn with_weight_multiplier(mut self, multiplier: f64) -> Self {
        self.weight_multiplier = if multiplier.is_finite() {
            multiplier.max(0.0)
        } else {
            0.0
        };
        self
    }
}

/// A vote recorded in a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub agent_id: AgentId,
    pub option_id: String,
    /// Confidence level (0.0 to 1.0)
    pub confidence: f64,
    /// Effective weight: standing weight snapshot times the ballot multiplier
    pub weight: f64,
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    /// Record a ballot at the given standing weight.
    pub fn from_ballot(ballot: Ballot, standing_weight: f64) -> Self {
        Self {
            agent_id: ballot.agent_id,
            option_id: ballot.option_id,
            confidence: ballot.confidence,
            weight: standing_weight * ballot.weight_multiplier,
            reasoning: ballot.reasoning,
            timestamp: Utc::now(),
        }
    }

    /// This vote's contribution to its option's tally.
    pub fn weighted_confidence(&self) -> f64 {
        self.confidence * self.weight
    }

    /// Get a short display name for the agent
    ///
    /// E.g., "lead-scorer-1" -> "lead"
    pub fn short_agent_name(&self) -> &str {
        let id = self.agent_id.as_str();
        id.split(['-', '_']).next().unwrap_or(id)
    }
}
