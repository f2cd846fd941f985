//! Agent entities handed out by the coordinating authority after a decision.

use super::value_objects::AgentId;
use crate::quorum::Recommendation;
use serde::{Deserialize, Serialize};

/// Role an agent plays in carrying out a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentRole {
    /// The agent proposed the winning option and drives its execution
    Lead,
    /// The agent supports execution of an option it did not propose
    Support,
}

/// Work fanned out to an agent once a decision has been made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    /// Decision that produced this assignment
    pub decision_id: String,
    /// Agent receiving the assignment
    pub agent_id: AgentId,
    /// The winning recommendation to carry out
    pub directive: Recommendation,
    pub role: AssignmentRole,
}

impl TaskAssignment {
    pub fn new(
        decision_id: impl Into<String>,
        agent_id: AgentId,
        directive: Recommendation,
        role: AssignmentRole,
    ) -> Self {
        Self {
            decision_id: decision_id.into(),
            agent_id,
            directive,
            role,
        }
    }

    pub fn is_lead(&self) -> bool {
        self.role == AssignmentRole::Lead
    }
}
