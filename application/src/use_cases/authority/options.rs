//! Vote option derivation from agent reports.
//!
//! Reports whose recommendations are structurally equal are grouped into one
//! option. Options are ranked by how many reports proposed them; equally
//! popular options keep the order in which they were first proposed.

use hive_domain::{AgentReport, Recommendation, VoteOption};
use std::collections::{HashMap, HashSet};

struct Candidate<'a> {
    value: &'a Recommendation,
    proposer: &'a AgentReport,
    count: usize,
}

/// Derive at most `max` ballot options from `reports`.
///
/// A label recommendation becomes an option with the label as id; any
/// other value gets a positional `option-N` id.
pub fn derive_options(reports: &[AgentReport], max: usize) -> Vec<VoteOption> {
    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for report in reports {
        let key = report.recommendation.canonical_key();
        match index.get(&key) {
            Some(&i) => candidates[i].count += 1,
            None => {
                index.insert(key, candidates.len());
                candidates.push(Candidate {
                    value: &report.recommendation,
                    proposer: report,
                    count: 1,
                });
            }
        }
    }

    // stable: ties keep first-proposed order
    candidates.sort_by(|a, b| b.count.cmp(&a.count));
    candidates.truncate(max);

    let mut used: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let id = match candidate.value {
                Recommendation::Label(label) if !label.is_empty() && !used.contains(label) => {
                    label.clone()
                }
                _ => positional_id(i + 1, &used),
            };
            used.insert(id.clone());
            VoteOption::new(id, candidate.value.clone(), candidate.value.summary())
                .proposed_by(candidate.proposer.agent_id.clone())
        })
        .collect()
}

fn positional_id(position: usize, used: &HashSet<String>) -> String {
    let mut n = position;
    loop {
        let id = format!("option-{}", n);
        if !used.contains(&id) {
            return id;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label(agent: &str, value: &str) -> AgentReport {
        AgentReport::new(agent, Recommendation::label(value), 0.8, "")
    }

    fn structured(agent: &str, value: serde_json::Value) -> AgentReport {
        AgentReport::new(agent, Recommendation::structured(value), 0.8, "")
    }

    #[test]
    fn test_groups_and_ranks_by_popularity() {
        let reports = vec![
            label("a", "pause-campaign"),
            label("b", "automate-follow-ups"),
            label("c", "automate-follow-ups"),
            label("d", "hire"),
            label("e", "automate-follow-ups"),
            label("f", "hire"),
        ];
        let options = derive_options(&reports, 5);
        let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["automate-follow-ups", "hire", "pause-campaign"]);
        assert_eq!(options[0].proposed_by.as_ref().unwrap().as_str(), "b");
    }

    #[test]
    fn test_structurally_equal_values_share_an_option() {
        let reports = vec![
            structured("a", json!({"action": "scale", "replicas": 3})),
            structured("b", json!({"replicas": 3.0, "action": "scale"})),
            structured("c", json!({"action": "hold"})),
        ];
        let options = derive_options(&reports, 5);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].id, "option-1");
        assert_eq!(options[1].id, "option-2");
        assert!(
            options[0]
                .value
                .structurally_equal(&reports[1].recommendation)
        );
    }

    #[test]
    fn test_caps_at_max_options() {
        let reports: Vec<AgentReport> = (0..8)
            .map(|i| label(&format!("a{}", i), &format!("idea-{}", i)))
            .collect();
        let options = derive_options(&reports, 5);
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].id, "idea-0");
        assert_eq!(options[4].id, "idea-4");
    }

    #[test]
    fn test_positional_ids_avoid_label_collisions() {
        let reports = vec![
            label("a", "option-2"),
            structured("b", json!([1, 2])),
            label("c", "option-2"),
        ];
        let options = derive_options(&reports, 5);
        assert_eq!(options[0].id, "option-2");
        assert_eq!(options[1].id, "option-3");
    }

    #[test]
    fn test_no_reports_no_options() {
        assert!(derive_options(&[], 5).is_empty());
    }
}
