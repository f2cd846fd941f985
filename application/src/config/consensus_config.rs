//! Consensus configuration: voting and decision-cycle parameters.
//!
//! [`ConsensusConfig`] is the application-level view of the recognized
//! configuration surface. The infrastructure layer builds it from TOML and
//! environment variables; tests and embedders build it directly.

use hive_domain::{ConfigIssue, ConfigIssueCode, QuorumThreshold, TieBreakerPolicy};
use std::time::Duration;

/// Decision-cycle parameters shared by the Voting Engine and the Authority.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusConfig {
    /// Minimum participating fraction of eligible voters (quorum)
    pub voting_threshold: f64,
    /// Default lifetime of a voting round
    pub voting_timeout: Duration,
    /// Who resolves ties before the deterministic fallback applies
    pub tie_breaker: TieBreakerPolicy,
    /// How long a tied round waits for the Authority's choice
    pub tie_break_grace: Duration,
    /// Round lifetime for ordinary decisions
    pub decision_timeout: Duration,
    /// Round lifetime for emergency decisions
    pub emergency_timeout: Duration,
    /// Per-worker report deadline in emergencies
    pub emergency_report_timeout: Duration,
    /// Weight multiplier of the Authority's own emergency vote
    pub emergency_weight_multiplier: f64,
    /// Upper bound on options derived from reports
    pub max_options: usize,
    /// Decisions older than this are ignored by history queries
    pub memory_retention_days: u32,
    /// Voter identity of the Authority itself
    pub authority_id: String,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            voting_threshold: 0.5,
            voting_timeout: Duration::from_secs(30),
            tie_breaker: TieBreakerPolicy::Queen,
            tie_break_grace: Duration::from_secs(2),
            decision_timeout: Duration::from_secs(30),
            emergency_timeout: Duration::from_secs(5),
            emergency_report_timeout: Duration::from_secs(3),
            emergency_weight_multiplier: 1.5,
            max_options: 5,
            memory_retention_days: 30,
            authority_id: "queen".to_string(),
        }
    }
}

impl ConsensusConfig {
    // ==================== Builder Methods ====================

    pub fn with_voting_threshold(mut self, threshold: f64) -> Self {
        self.voting_threshold = threshold;
        self
    }

    pub fn with_voting_timeout(mut self, timeout: Duration) -> Self {
        self.voting_timeout = timeout;
        self
    }

    pub fn with_tie_breaker(mut self, policy: TieBreakerPolicy) -> Self {
        self.tie_breaker = policy;
        self
    }

    pub fn with_tie_break_grace(mut self, grace: Duration) -> Self {
        self.tie_break_grace = grace;
        self
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    pub fn with_emergency_timeout(mut self, timeout: Duration) -> Self {
        self.emergency_timeout = timeout;
        self
    }

    pub fn with_emergency_report_timeout(mut self, timeout: Duration) -> Self {
        self.emergency_report_timeout = timeout;
        self
    }

    pub fn with_emergency_weight_multiplier(mut self, multiplier: f64) -> Self {
        self.emergency_weight_multiplier = multiplier;
        self
    }

    pub fn with_max_options(mut self, max: usize) -> Self {
        self.max_options = max;
        self
    }

    pub fn with_memory_retention_days(mut self, days: u32) -> Self {
        self.memory_retention_days = days;
        self
    }

    pub fn with_authority_id(mut self, id: impl Into<String>) -> Self {
        self.authority_id = id.into();
        self
    }

    // ==================== Derived Views ====================

    pub fn quorum(&self) -> QuorumThreshold {
        QuorumThreshold::new(self.voting_threshold)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::from(self)
    }

    /// Check the configuration for unusable or suspicious values.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !(self.voting_threshold > 0.0 && self.voting_threshold <= 1.0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "voting_threshold".to_string(),
                    value: self.voting_threshold.to_string(),
                },
                format!(
                    "voting_threshold must be in (0, 1], got {}",
                    self.voting_threshold
                ),
            ));
        }

        for (field, value) in [
            ("voting_timeout", self.voting_timeout),
            ("decision_timeout", self.decision_timeout),
            ("emergency_timeout", self.emergency_timeout),
            ("emergency_report_timeout", self.emergency_report_timeout),
        ] {
            if value.is_zero() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroDuration {
                        field: field.to_string(),
                    },
                    format!("{} must be greater than zero", field),
                ));
            }
        }

        if self.emergency_report_timeout > self.emergency_timeout {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::Inconsistent {
                    fields: vec![
                        "emergency_report_timeout".to_string(),
                        "emergency_timeout".to_string(),
                    ],
                },
                "emergency_report_timeout exceeds emergency_timeout; \
                 slow reports will arrive after the round has closed",
            ));
        }

        if self.emergency_weight_multiplier.is_nan() || self.emergency_weight_multiplier < 1.0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "emergency_weight_multiplier".to_string(),
                    value: self.emergency_weight_multiplier.to_string(),
                },
                "emergency_weight_multiplier below 1.0 weakens the Authority's emergency vote",
            ));
        }

        if self.max_options == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "max_options".to_string(),
                    value: "0".to_string(),
                },
                "max_options must be at least 1",
            ));
        }

        issues
    }
}

/// The slice of [`ConsensusConfig`] the Voting Engine needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub quorum: QuorumThreshold,
    pub default_timeout: Duration,
    pub tie_break_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings::from(&ConsensusConfig::default())
    }
}

impl From<&ConsensusConfig> for EngineSettings {
    fn from(config: &ConsensusConfig) -> Self {
        Self {
            quorum: config.quorum(),
            default_timeout: config.voting_timeout,
            tie_break_grace: config.tie_break_grace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_domain::core::validation::has_errors;

    #[test]
    fn test_defaults() {
        let config = ConsensusConfig::default();
        assert_eq!(config.voting_threshold, 0.5);
        assert_eq!(config.voting_timeout, Duration::from_secs(30));
        assert_eq!(config.tie_breaker, TieBreakerPolicy::Queen);
        assert_eq!(config.emergency_timeout, Duration::from_secs(5));
        assert_eq!(config.emergency_report_timeout, Duration::from_secs(3));
        assert_eq!(config.emergency_weight_multiplier, 1.5);
        assert_eq!(config.max_options, 5);
        assert_eq!(config.memory_retention_days, 30);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_bad_threshold_and_zero_timeout() {
        let config = ConsensusConfig::default()
            .with_voting_threshold(1.5)
            .with_decision_timeout(Duration::ZERO);
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(has_errors(&issues));
    }

    #[test]
    fn test_validate_warns_on_inconsistent_emergency_timeouts() {
        let config = ConsensusConfig::default()
            .with_emergency_report_timeout(Duration::from_secs(10));
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(!has_errors(&issues));
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::Inconsistent { .. }
        ));
    }

    #[test]
    fn test_engine_settings_from_config() {
        let settings = ConsensusConfig::default()
            .with_voting_threshold(0.75)
            .engine_settings();
        assert_eq!(settings.quorum.fraction(), 0.75);
        assert_eq!(settings.default_timeout, Duration::from_secs(30));
        assert_eq!(settings.tie_break_grace, Duration::from_secs(2));
    }
}
