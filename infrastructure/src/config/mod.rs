//! Configuration file loading for hive-quorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `HIVE_` prefixed environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./hive.toml` or `./.hive.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/hive-quorum/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileConsensusConfig, FileLoggingConfig, FileMemoryConfig,
};
pub use loader::ConfigLoader;
