//! Consensus configuration from TOML (`[consensus]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [consensus]
//! voting_threshold = 0.6
//! voting_timeout_ms = 20000
//! tie_breaker = "queen"          # or "deterministic-first"
//! emergency_timeout_ms = 5000
//! emergency_report_timeout_ms = 3000
//! ```

use hive_domain::{ConfigIssue, ConfigIssueCode, TieBreakerPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[consensus]` section. Durations are given in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    /// Quorum fraction of eligible voters, in (0, 1]
    pub voting_threshold: f64,
    pub voting_timeout_ms: u64,
    /// "queen" or "deterministic-first"
    pub tie_breaker: String,
    pub tie_break_grace_ms: u64,
    pub decision_timeout_ms: u64,
    pub emergency_timeout_ms: u64,
    pub emergency_report_timeout_ms: u64,
    pub emergency_weight_multiplier: f64,
    pub max_options: usize,
    /// Voter identity of the coordinating authority
    pub authority_id: String,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        Self {
            voting_threshold: 0.5,
            voting_timeout_ms: 30_000,
            tie_breaker: "queen".to_string(),
            tie_break_grace_ms: 2_000,
            decision_timeout_ms: 30_000,
            emergency_timeout_ms: 5_000,
            emergency_report_timeout_ms: 3_000,
            emergency_weight_multiplier: 1.5,
            max_options: 5,
            authority_id: "queen".to_string(),
        }
    }
}

impl FileConsensusConfig {
    /// Parse the tie-breaker string, falling back to the default policy.
    pub fn parse_tie_breaker(&self) -> (TieBreakerPolicy, Vec<ConfigIssue>) {
        match self.tie_breaker.parse::<TieBreakerPolicy>() {
            Ok(policy) => (policy, vec![]),
            Err(_) => (
                TieBreakerPolicy::default(),
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "consensus.tie_breaker".to_string(),
                        value: self.tie_breaker.clone(),
                        valid_values: vec![
                            TieBreakerPolicy::Queen.to_string(),
                            TieBreakerPolicy::DeterministicFirst.to_string(),
                        ],
                    },
                    format!(
                        "consensus.tie_breaker: unknown value '{}', expected 'queen' or 'deterministic-first'",
                        self.tie_breaker
                    ),
                )],
            ),
        }
    }

    pub fn voting_timeout(&self) -> Duration {
        Duration::from_millis(self.voting_timeout_ms)
    }

    pub fn tie_break_grace(&self) -> Duration {
        Duration::from_millis(self.tie_break_grace_ms)
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    pub fn emergency_timeout(&self) -> Duration {
        Duration::from_millis(self.emergency_timeout_ms)
    }

    pub fn emergency_report_timeout(&self) -> Duration {
        Duration::from_millis(self.emergency_report_timeout_ms)
    }
}
