//! Decision memory configuration from TOML (`[memory]` section)
//!
//! ```toml
//! [memory]
//! path = "~/.local/share/hive-quorum/decisions.jsonl"
//! retention_days = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw `[memory]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMemoryConfig {
    /// JSONL decision log. Without it decisions are kept in memory only.
    pub path: Option<PathBuf>,
    /// Decisions older than this are left out of history queries
    pub retention_days: u32,
}

impl Default for FileMemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            retention_days: 30,
        }
    }
}
