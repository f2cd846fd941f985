//! Participation patterns mined from decision history.
//!
//! An agent *agreed with* a decision when its counted vote chose the winner.
//! Its success rate is the fraction of the agreed decisions with recorded
//! feedback that were marked successful. Agents without any such decision
//! produce no pattern at all, rather than a zero rate.

use super::record::DecisionRecord;
use crate::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Historical track record of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPattern {
    pub agent_id: AgentId,
    /// `successful_decisions / agreed_decisions`
    pub success_rate: f64,
    /// Evaluated decisions the agent voted for the winner of
    pub agreed_decisions: usize,
    pub successful_decisions: usize,
}

/// Derive per-agent success rates, ordered by agent id.
pub fn analyze_decision_patterns(history: &[DecisionRecord]) -> Vec<AgentPattern> {
    let mut counts: BTreeMap<AgentId, (usize, usize)> = BTreeMap::new();

    for record in history {
        let (Some(majority), Some(success)) = (record.majority(), record.success) else {
            continue;
        };

        for vote in majority.supporting_votes() {
            let entry = counts.entry(vote.agent_id.clone()).or_default();
            entry.0 += 1;
            if success {
                entry.1 += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|(agent_id, (agreed, successful))| AgentPattern {
            agent_id,
            success_rate: successful as f64 / agreed as f64,
            agreed_decisions: agreed,
            successful_decisions: successful,
        })
        .collect()
}
