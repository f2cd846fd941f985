//! Worker agent port
//!
//! Defines the narrow contract the Coordinating Authority consumes from the
//! autonomous workers it coordinates. How a worker arrives at its
//! recommendation is entirely its own business.

use async_trait::async_trait;
use hive_domain::{AgentId, AgentReport, AgentStatus, TaskAssignment, TopicContext};
use thiserror::Error;

/// Errors a worker can report back to the Authority
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkerError {
    #[error("Worker failed: {0}")]
    Failed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Worker unavailable: {0}")]
    Unavailable(String),
}

/// An autonomous worker participating in decision cycles.
///
/// Implementations (adapters) live in the infrastructure layer or in the
/// embedding application.
#[async_trait]
pub trait WorkerAgent: Send + Sync {
    /// Stable id used as the worker's voter identity
    fn id(&self) -> &AgentId;

    /// Current availability, as reported by the worker
    fn status(&self) -> AgentStatus;

    /// Produce a recommendation on `topic`.
    async fn generate_report(
        &self,
        topic: &str,
        context: &TopicContext,
    ) -> Result<AgentReport, WorkerError>;

    /// Accept a task assignment resulting from a decision.
    ///
    /// Workers that do not act on assignments can rely on the default no-op.
    async fn assign_task(&self, _assignment: &TaskAssignment) -> Result<(), WorkerError> {
        Ok(())
    }
}
