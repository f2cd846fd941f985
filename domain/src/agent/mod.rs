//! Agent domain - the worker side of the swarm.
//!
//! Workers are external collaborators. The domain only models what the
//! coordinating authority exchanges with them: identifiers, status,
//! reports, and the task assignments fanned out after a decision.

pub mod entities;
pub mod value_objects;

pub use entities::{AssignmentRole, TaskAssignment};
pub use value_objects::{AgentId, AgentReport, AgentStatus};
