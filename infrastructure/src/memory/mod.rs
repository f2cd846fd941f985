//! Decision memory adapters
//!
//! Two implementations of the
//! [`DecisionMemory`](hive_application::DecisionMemory) port:
//!
//! - [`InMemoryDecisionMemory`]: process-local, optionally bounded
//! - [`JsonlDecisionMemory`]: append-only JSON lines file, reloaded on open
//!
//! Both keep decisions and outcome feedback as separate entries. Stored
//! records are never rewritten; the latest outcome is resolved when history
//! is read back. History is ordered by record timestamp, not by the order
//! records happened to be written.

mod in_memory;
mod jsonl;

pub use in_memory::InMemoryDecisionMemory;
pub use jsonl::JsonlDecisionMemory;

use chrono::{DateTime, Duration, Utc};
use hive_domain::DecisionRecord;
use std::collections::HashMap;

/// Decisions plus their outcome feedback, shared by both adapters.
#[derive(Debug, Default)]
pub(crate) struct DecisionLog {
    records: Vec<DecisionRecord>,
    /// Latest feedback per decision id
    outcomes: HashMap<String, bool>,
    /// `None` keeps every record visible
    retention: Option<Duration>,
}

impl DecisionLog {
    pub(crate) fn new(retention_days: Option<u32>) -> Self {
        Self {
            retention: retention_days.map(|days| Duration::days(i64::from(days))),
            ..Default::default()
        }
    }

    /// Add a record in timestamp order. Records stamped at the same
    /// instant keep their arrival order.
    pub(crate) fn append(&mut self, record: DecisionRecord) {
        let at = self
            .records
            .partition_point(|r| r.timestamp <= record.timestamp);
        self.records.insert(at, record);
    }

    pub(crate) fn contains(&self, decision_id: &str) -> bool {
        self.records.iter().any(|r| r.id == decision_id)
    }

    pub(crate) fn set_outcome(&mut self, decision_id: &str, success: bool) {
        self.outcomes.insert(decision_id.to_string(), success);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Forget the oldest records so that at most `keep` remain.
    pub(crate) fn evict_to(&mut self, keep: usize) {
        if self.records.len() <= keep {
            return;
        }
        let excess = self.records.len() - keep;
        for evicted in self.records.drain(..excess) {
            self.outcomes.remove(&evicted.id);
        }
    }

    fn is_retained(&self, record: &DecisionRecord, now: DateTime<Utc>) -> bool {
        match self.retention {
            Some(window) => record.timestamp >= now - window,
            None => true,
        }
    }

    /// Records visible at `now`, oldest first, with outcomes resolved.
    pub(crate) fn history(&self, limit: Option<usize>, now: DateTime<Utc>) -> Vec<DecisionRecord> {
        let visible: Vec<&DecisionRecord> = self
            .records
            .iter()
            .filter(|r| self.is_retained(r, now))
            .collect();

        let skip = limit.map_or(0, |n| visible.len().saturating_sub(n));

        visible
            .into_iter()
            .skip(skip)
            .map(|record| {
                let mut record = record.clone();
                if let Some(success) = self.outcomes.get(&record.id) {
                    record.success = Some(*success);
                }
                record
            })
            .collect()
    }

    pub(crate) fn visible_count(&self, now: DateTime<Utc>) -> usize {
        self.records
            .iter()
            .filter(|r| self.is_retained(r, now))
            .count()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;

    #[test]
    fn test_history_resolves_latest_outcome() {
        let now = Utc::now();
        let mut log = DecisionLog::new(None);
        log.append(record("d1", "expand", now));
        log.set_outcome("d1", false);
        log.set_outcome("d1", true);

        let history = log.history(None, now);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].success, Some(true));
    }

    #[test]
    fn test_history_limit_keeps_most_recent_in_order() {
        let now = Utc::now();
        let mut log = DecisionLog::new(None);
        for id in ["d1", "d2", "d3", "d4"] {
            log.append(record(id, "expand", now));
        }

        let ids: Vec<String> = log.history(Some(2), now).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["d3", "d4"]);
    }

    #[test]
    fn test_late_append_lands_in_close_order() {
        let now = Utc::now();
        let mut log = DecisionLog::new(None);
        log.append(record("first", "expand", now - Duration::seconds(3)));
        log.append(record("third", "hold", now - Duration::seconds(1)));
        // closed second, written last
        log.append(record("second", "expand", now - Duration::seconds(2)));

        let ids: Vec<String> = log.history(None, now).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_retention_hides_old_records() {
        let now = Utc::now();
        let mut log = DecisionLog::new(Some(30));
        log.append(record("old", "expand", now - Duration::days(31)));
        log.append(record("new", "hold", now - Duration::days(2)));

        let history = log.history(None, now);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "new");
        assert_eq!(log.visible_count(now), 1);
        // hidden, not deleted
        assert_eq!(log.len(), 2);
        assert!(log.contains("old"));
    }

    #[test]
    fn test_evict_drops_oldest_and_their_outcomes() {
        let now = Utc::now();
        let mut log = DecisionLog::new(None);
        for id in ["d1", "d2", "d3"] {
            log.append(record(id, "expand", now));
            log.set_outcome(id, true);
        }
        log.evict_to(2);

        assert!(!log.contains("d1"));
        assert!(!log.outcomes.contains_key("d1"));
        assert_eq!(log.len(), 2);
    }
}
