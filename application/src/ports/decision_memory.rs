//! Decision memory port
//!
//! Append-only store of past decisions. The Authority writes one record per
//! completed decision cycle and mines the history for per-agent success
//! rates that feed back into vote weights.

use async_trait::async_trait;
use hive_domain::decision::is_similar;
use hive_domain::{AgentPattern, DecisionRecord, DecisionType, Recommendation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during decision memory operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Memory unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown decision: {0}")]
    UnknownDecision(String),
}

/// Liveness and capacity signal of a memory backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHealth {
    pub healthy: bool,
    /// Short backend name (e.g. "in-memory", "jsonl")
    pub backend: String,
    /// Decisions currently visible to history queries
    pub record_count: usize,
    /// Upper bound on stored records, if the backend has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MemoryHealth {
    pub fn healthy(backend: impl Into<String>, record_count: usize) -> Self {
        Self {
            healthy: true,
            backend: backend.into(),
            record_count,
            capacity: None,
            detail: None,
        }
    }

    pub fn unhealthy(backend: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            backend: backend.into(),
            record_count: 0,
            capacity: None,
            detail: Some(detail.into()),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Durable append-only log of decisions.
#[async_trait]
pub trait DecisionMemory: Send + Sync {
    /// Append a decision. Existing records are never mutated.
    async fn store_decision(&self, record: &DecisionRecord) -> Result<(), MemoryError>;

    /// Append later feedback on whether a stored decision worked out.
    ///
    /// The latest outcome wins when history is read back.
    async fn record_outcome(&self, decision_id: &str, success: bool) -> Result<(), MemoryError>;

    /// Past decisions in chronological order, with outcomes resolved.
    ///
    /// With a `limit`, only the most recent `limit` records are returned
    /// (still oldest first).
    async fn get_decision_history(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<DecisionRecord>, MemoryError>;

    /// Decisions of the same type whose outcome resembles `value`.
    async fn find_similar_decisions(
        &self,
        decision_type: DecisionType,
        value: &Recommendation,
    ) -> Result<Vec<DecisionRecord>, MemoryError> {
        let history = self.get_decision_history(None).await?;
        Ok(history
            .into_iter()
            .filter(|record| is_similar(record, decision_type, value))
            .collect())
    }

    /// Per-agent success rates over `history`.
    fn analyze_decision_patterns(&self, history: &[DecisionRecord]) -> Vec<AgentPattern> {
        hive_domain::analyze_decision_patterns(history)
    }

    async fn get_health_status(&self) -> MemoryHealth;
}
