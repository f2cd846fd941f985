//! Logging configuration from TOML (`[logging]` section)
//!
//! ```toml
//! [logging]
//! events_path = "events.jsonl"   # consensus events, one JSON object per line
//! log_file = "hive-quorum.log"   # diagnostic log, in addition to stderr
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub events_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}
