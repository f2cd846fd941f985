//! Decision records - the persisted outcome of a decision cycle.

use crate::quorum::{MajorityResult, Recommendation, RoundOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of decision cycle that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionType {
    Strategic,
    Emergency,
}

impl DecisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Strategic => "strategic",
            DecisionType::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for DecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How pressing an ordinary decision is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "normal" | "medium" => Ok(Urgency::Normal),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            _ => Err(format!(
                "Unknown urgency: {}. Valid: low, normal, high, critical",
                s
            )),
        }
    }
}

/// Severity of an emergency situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencySeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EmergencySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencySeverity::Low => "low",
            EmergencySeverity::Medium => "medium",
            EmergencySeverity::High => "high",
            EmergencySeverity::Critical => "critical",
        }
    }
}

impl std::str::FromStr for EmergencySeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(EmergencySeverity::Low),
            "medium" => Ok(EmergencySeverity::Medium),
            "high" => Ok(EmergencySeverity::High),
            "critical" => Ok(EmergencySeverity::Critical),
            _ => Err(format!(
                "Unknown severity: {}. Valid: low, medium, high, critical",
                s
            )),
        }
    }
}

impl std::fmt::Display for EmergencySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a decision cycle produced a decision.
///
/// A deferred decision is never an approval: it has no winner and must be
/// re-queued or escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Decided,
    Deferred,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Decided => write!(f, "decided"),
            DecisionStatus::Deferred => write!(f, "deferred"),
        }
    }
}

/// Outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: String,
    pub decision_type: DecisionType,
    /// The question that was decided
    pub topic: String,
    /// Human-readable decision statement
    pub content: String,
    pub outcome: RoundOutcome,
    #[serde(default)]
    pub urgency: Urgency,
    /// Ids of past decisions referenced in the statement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_decisions: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Later feedback on whether the decision worked out (`None` until marked)
    #[serde(default)]
    pub success: Option<bool>,
}

impl DecisionRecord {
    pub fn status(&self) -> DecisionStatus {
        if self.outcome.is_deferred() {
            DecisionStatus::Deferred
        } else {
            DecisionStatus::Decided
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.status() == DecisionStatus::Deferred
    }

    pub fn majority(&self) -> Option<&MajorityResult> {
        self.outcome.result()
    }

    /// Value of the winning option, if a winner was chosen.
    pub fn winning_value(&self) -> Option<&Recommendation> {
        self.majority().map(|m| &m.winner.value)
    }

    pub fn with_success(mut self, success: Option<bool>) -> Self {
        self.success = success;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quorum::Participation;

    #[test]
    fn test_deferred_record_status() {
        let record = DecisionRecord {
            id: "d-1".to_string(),
            decision_type: DecisionType::Strategic,
            topic: "Expand?".to_string(),
            content: "Deferred".to_string(),
            outcome: RoundOutcome::Deferred(Participation::new(6, 2)),
            urgency: Urgency::Normal,
            related_decisions: vec![],
            timestamp: Utc::now(),
            success: None,
        };
        assert!(record.is_deferred());
        assert_eq!(record.status().to_string(), "deferred");
        assert!(record.majority().is_none());
        assert!(record.winning_value().is_none());
    }

    #[test]
    fn test_parse_urgency_and_severity() {
        assert_eq!("HIGH".parse::<Urgency>().ok(), Some(Urgency::High));
        assert_eq!("medium".parse::<Urgency>().ok(), Some(Urgency::Normal));
        assert!("soon".parse::<Urgency>().is_err());
        assert_eq!(
            "critical".parse::<EmergencySeverity>().ok(),
            Some(EmergencySeverity::Critical)
        );
        assert!(EmergencySeverity::High > EmergencySeverity::Low);
    }
}
