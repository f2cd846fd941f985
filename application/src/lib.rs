//! Application layer for hive-quorum
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConsensusConfig, EngineSettings};
pub use ports::{
    consensus_events::{CompositeObserver, ConsensusEvent, ConsensusObserver, NoObserver},
    decision_memory::{DecisionMemory, MemoryError, MemoryHealth},
    tie_breaker::TieBreakResolver,
    worker_agent::{WorkerAgent, WorkerError},
};
pub use use_cases::authority::{
    AuthorityError, CollaborationPlan, CoordinatingAuthority, DeferredDecision, HealthLevel,
    QueenTieBreaker, SwarmHealth,
};
pub use use_cases::voting_engine::VotingEngine;
