//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod consensus_events;
pub mod decision_memory;
pub mod tie_breaker;
pub mod worker_agent;
