//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the application's
//! [`ConsensusConfig`] once merged.

mod consensus;
mod logging;
mod memory;

pub use consensus::FileConsensusConfig;
pub use logging::FileLoggingConfig;
pub use memory::FileMemoryConfig;

use hive_application::ConsensusConfig;
use hive_domain::core::validation::has_errors;
use hive_domain::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration that cannot be used at all
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration ({count} error(s)): {summary}")]
    Invalid { count: usize, summary: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Voting and decision-cycle settings
    pub consensus: FileConsensusConfig,
    /// Decision memory settings
    pub memory: FileMemoryConfig,
    /// Event log and diagnostic log settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Build the application configuration from the raw sections.
    ///
    /// An unknown tie-breaker falls back to the default policy; use
    /// [`validate`](Self::validate) to surface it.
    pub fn to_consensus_config(&self) -> ConsensusConfig {
        let c = &self.consensus;
        ConsensusConfig::default()
            .with_voting_threshold(c.voting_threshold)
            .with_voting_timeout(c.voting_timeout())
            .with_tie_breaker(c.parse_tie_breaker().0)
            .with_tie_break_grace(c.tie_break_grace())
            .with_decision_timeout(c.decision_timeout())
            .with_emergency_timeout(c.emergency_timeout())
            .with_emergency_report_timeout(c.emergency_report_timeout())
            .with_emergency_weight_multiplier(c.emergency_weight_multiplier)
            .with_max_options(c.max_options)
            .with_memory_retention_days(self.memory.retention_days)
            .with_authority_id(c.authority_id.clone())
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.consensus.parse_tie_breaker().1);
        issues.extend(self.to_consensus_config().validate());

        if self.memory.retention_days == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "memory.retention_days".to_string(),
                    value: "0".to_string(),
                },
                "memory.retention_days = 0 hides every past decision; agent weights will never adapt",
            ));
        }

        if self.consensus.authority_id.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "consensus.authority_id".to_string(),
                    value: String::new(),
                },
                "consensus.authority_id cannot be empty",
            ));
        }

        issues
    }

    /// Validate and convert in one step, failing on any error-level issue.
    ///
    /// Warnings are returned alongside the config for the caller to print.
    pub fn into_validated(
        self,
    ) -> Result<(ConsensusConfig, Vec<ConfigIssue>), ConfigValidationError> {
        let issues = self.validate();
        if has_errors(&issues) {
            let errors: Vec<&str> = issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .map(|i| i.message.as_str())
                .collect();
            return Err(ConfigValidationError::Invalid {
                count: errors.len(),
                summary: errors.join("; "),
            });
        }
        Ok((self.to_consensus_config(), issues))
    }
}
