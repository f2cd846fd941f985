//! Quorum and tie-break rules
//!
//! - [`QuorumThreshold`] decides whether enough eligible voters took part for
//!   a round to produce a winner at all.
//! - [`TieBreakerPolicy`] decides who resolves a tie between leading options.

use serde::{Deserialize, Serialize};

/// Minimum participation fraction for a round to close with a winner.
///
/// # Example
///
/// ```
/// use hive_domain::quorum::QuorumThreshold;
///
/// let quorum = QuorumThreshold::default(); // 0.5
/// assert!(quorum.is_satisfied(3, 6));  // 50% participation
/// assert!(!quorum.is_satisfied(2, 6)); // 33% participation
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuorumThreshold(f64);

impl QuorumThreshold {
    /// Create a threshold, clamped into `[0, 1]`.
    pub fn new(fraction: f64) -> Self {
        if fraction.is_finite() {
            Self(fraction.clamp(0.0, 1.0))
        } else {
            Self::default()
        }
    }

    pub fn fraction(&self) -> f64 {
        self.0
    }

    /// Check whether `actual` out of `eligible` voters meets the threshold.
    pub fn is_satisfied(&self, actual: usize, eligible: usize) -> bool {
        if eligible == 0 {
            return false;
        }
        (actual as f64 / eligible as f64) >= self.0
    }

    /// Minimum number of voters needed out of `eligible`.
    pub fn min_voters_needed(&self, eligible: usize) -> usize {
        (eligible as f64 * self.0).ceil() as usize
    }
}

impl Default for QuorumThreshold {
    fn default() -> Self {
        Self(0.5)
    }
}

impl std::fmt::Display for QuorumThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", (self.0 * 100.0).round())
    }
}

impl std::str::FromStr for QuorumThreshold {
    type Err = String;

    /// Accepts a fraction (`0.6`) or a percentage (`60%`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let fraction = if let Some(pct) = s.strip_suffix('%') {
            pct.trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid percentage: {}", s))?
                / 100.0
        } else {
            s.parse::<f64>()
                .map_err(|_| format!("Invalid quorum threshold: {}", s))?
        };

        if !(0.0..=1.0).contains(&fraction) {
            return Err(format!("Quorum threshold out of range [0, 1]: {}", s));
        }
        Ok(Self(fraction))
    }
}

/// Who resolves a tie between options with equal maximum tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreakerPolicy {
    /// The coordinating authority is asked first; the deterministic rule
    /// applies if it abstains or misses the grace period
    #[default]
    Queen,
    /// The option listed first in the topic wins, without consulting anyone
    DeterministicFirst,
}

impl TieBreakerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreakerPolicy::Queen => "queen",
            TieBreakerPolicy::DeterministicFirst => "deterministic-first",
        }
    }

    /// Whether the authority holds tie-breaking power.
    pub fn authority_decides(&self) -> bool {
        matches!(self, TieBreakerPolicy::Queen)
    }
}

impl std::fmt::Display for TieBreakerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TieBreakerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queen" | "authority" => Ok(TieBreakerPolicy::Queen),
            "deterministic-first" | "deterministic_first" | "first" => {
                Ok(TieBreakerPolicy::DeterministicFirst)
            }
            _ => Err(format!(
                "Unknown tie breaker: {}. Valid: queen, deterministic-first",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_satisfied() {
        let quorum = QuorumThreshold::new(0.5);
        assert!(!quorum.is_satisfied(1, 3));
        assert!(quorum.is_satisfied(2, 3));
        assert!(quorum.is_satisfied(2, 4));
        assert!(!quorum.is_satisfied(2, 6));
    }

    #[test]
    fn test_zero_eligible_never_satisfied() {
        assert!(!QuorumThreshold::new(0.0).is_satisfied(0, 0));
    }

    #[test]
    fn test_threshold_clamped() {
        assert_eq!(QuorumThreshold::new(1.7).fraction(), 1.0);
        assert_eq!(QuorumThreshold::new(-1.0).fraction(), 0.0);
        assert_eq!(QuorumThreshold::new(f64::NAN).fraction(), 0.5);
    }

    #[test]
    fn test_min_voters_needed() {
        assert_eq!(QuorumThreshold::new(0.5).min_voters_needed(6), 3);
        assert_eq!(QuorumThreshold::new(0.75).min_voters_needed(5), 4);
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!("0.6".parse::<QuorumThreshold>().ok(), Some(QuorumThreshold::new(0.6)));
        assert_eq!("75%".parse::<QuorumThreshold>().ok(), Some(QuorumThreshold::new(0.75)));
        assert!("150%".parse::<QuorumThreshold>().is_err());
        assert!("half".parse::<QuorumThreshold>().is_err());
    }

    #[test]
    fn test_parse_tie_breaker() {
        assert_eq!("queen".parse::<TieBreakerPolicy>().ok(), Some(TieBreakerPolicy::Queen));
        assert_eq!(
            "deterministic-first".parse::<TieBreakerPolicy>().ok(),
            Some(TieBreakerPolicy::DeterministicFirst)
        );
        assert_eq!(
            "First".parse::<TieBreakerPolicy>().ok(),
            Some(TieBreakerPolicy::DeterministicFirst)
        );
        assert!("coin-flip".parse::<TieBreakerPolicy>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(QuorumThreshold::default().to_string(), "50%");
        assert_eq!(TieBreakerPolicy::DeterministicFirst.to_string(), "deterministic-first");
        assert_eq!(TieBreakerPolicy::default(), TieBreakerPolicy::Queen);
    }
}
