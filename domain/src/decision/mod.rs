//! Decision domain - records of past decisions and what they teach.
//!
//! - [`record::DecisionRecord`]: append-only outcome of a decision cycle
//! - [`patterns::analyze_decision_patterns`]: per-agent success rates
//! - [`similarity::is_similar`]: related-decision matching

pub mod patterns;
pub mod record;
pub mod similarity;

pub use patterns::{AgentPattern, analyze_decision_patterns};
pub use record::{DecisionRecord, DecisionStatus, DecisionType, EmergencySeverity, Urgency};
pub use similarity::is_similar;
