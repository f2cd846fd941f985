//! Application-level configuration.
//!
//! - [`ConsensusConfig`]: quorum, timeouts, tie-break policy, emergency tuning
//! - [`EngineSettings`]: the slice the Voting Engine consumes

pub mod consensus_config;

pub use consensus_config::{ConsensusConfig, EngineSettings};
