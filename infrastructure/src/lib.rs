//! Infrastructure layer for hive-quorum
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: decision memory backends, consensus event sinks,
//! scripted worker agents, and configuration file loading.

pub mod config;
pub mod logging;
pub mod memory;
pub mod workers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileConsensusConfig, FileLoggingConfig,
    FileMemoryConfig,
};
pub use logging::{BroadcastEventBus, JsonlEventLog};
pub use memory::{InMemoryDecisionMemory, JsonlDecisionMemory};
pub use workers::{Scenario, ScenarioError, ScriptedWorker, WorkerScript};
