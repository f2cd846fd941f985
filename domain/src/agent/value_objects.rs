//! Agent value objects - identifiers and reports exchanged with worker agents.
//!
//! # Identifiers
//! - [`AgentId`] - Stable identifier of a registered worker (or the authority)
//!
//! # Reports
//! - [`AgentReport`] - A worker's answer to a topic: recommendation, confidence, reasoning
//! - [`AgentStatus`] - Liveness state a worker reports about itself

use crate::quorum::Recommendation;
use serde::{Deserialize, Serialize};

/// Unique identifier for an agent participating in the swarm.
///
/// Ordered so that per-round vote maps iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an AgentId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for AgentId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Self-reported state of a worker agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Active,
    Busy,
    Error,
    Offline,
}

impl AgentStatus {
    /// Whether the agent can accept a task assignment.
    pub fn is_available(&self) -> bool {
        matches!(self, AgentStatus::Idle | AgentStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Active => "active",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
            AgentStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Report produced by a worker for a topic.
///
/// Only this narrow contract is consumed from workers; how the
/// recommendation is produced is the worker's own business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    /// Worker that produced the report
    pub agent_id: AgentId,
    /// Recommended course of action
    pub recommendation: Recommendation,
    /// Confidence in the recommendation (0.0 to 1.0)
    pub confidence: f64,
    /// Free-form justification
    pub reasoning: String,
}

impl AgentReport {
    pub fn new(
        agent_id: impl Into<AgentId>,
        recommendation: Recommendation,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            recommendation,
            confidence: clamp_unit(confidence),
            reasoning: reasoning.into(),
        }
    }
}

/// Clamp a value into `[0, 1]`, mapping non-finite input to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_display_and_ordering() {
        let a = AgentId::new("analyst");
        let b = AgentId::from("builder");
        assert_eq!(a.to_string(), "analyst");
        assert!(a < b);
    }

    #[test]
    fn test_report_confidence_is_clamped() {
        let report = AgentReport::new("a", Recommendation::label("x"), 1.7, "sure");
        assert_eq!(report.confidence, 1.0);

        let report = AgentReport::new("a", Recommendation::label("x"), f64::NAN, "?");
        assert_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_status_availability() {
        assert!(AgentStatus::Idle.is_available());
        assert!(AgentStatus::Active.is_available());
        assert!(!AgentStatus::Busy.is_available());
        assert!(!AgentStatus::Offline.is_available());
        assert_eq!(AgentStatus::Error.to_string(), "error");
    }
}
