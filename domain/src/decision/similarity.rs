//! Similarity between past decisions, used to reference related history in
//! decision statements.
//!
//! A record is similar to a query when it has the same decision type and
//! either its winning value is structurally equal to the queried value, or
//! the word tokens of its topic and winning label overlap the query's by at
//! least [`SIMILARITY_THRESHOLD`] (Jaccard index).

use super::record::{DecisionRecord, DecisionType};
use crate::quorum::Recommendation;
use std::collections::BTreeSet;

pub const SIMILARITY_THRESHOLD: f64 = 0.5;

pub fn is_similar(record: &DecisionRecord, decision_type: DecisionType, value: &Recommendation) -> bool {
    if record.decision_type != decision_type {
        return false;
    }

    if record
        .winning_value()
        .is_some_and(|winner| winner.structurally_equal(value))
    {
        return true;
    }

    let query = tokens(&value.summary());
    let mut candidate = tokens(&record.topic);
    if let Some(winner) = record.winning_value() {
        candidate.extend(tokens(&winner.summary()));
    }
    jaccard(&query, &candidate) >= SIMILARITY_THRESHOLD
}

/// Lower-cased alphanumeric word tokens.
pub fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        let t = tokens("Automate follow-ups, now!");
        assert_eq!(
            t.into_iter().collect::<Vec<_>>(),
            vec!["automate", "follow", "now", "ups"]
        );
    }

    #[test]
    fn test_jaccard() {
        let a = tokens("automate follow ups");
        let b = tokens("automate follow ups weekly");
        assert!((jaccard(&a, &b) - 0.75).abs() < 1e-12);
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }
}
