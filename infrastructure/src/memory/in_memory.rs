//! Process-local decision memory.

use super::DecisionLog;
use async_trait::async_trait;
use chrono::Utc;
use hive_application::{DecisionMemory, MemoryError, MemoryHealth};
use hive_domain::DecisionRecord;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Decision memory that lives as long as the process.
///
/// With a capacity, the oldest decisions are forgotten once it is exceeded.
#[derive(Debug)]
pub struct InMemoryDecisionMemory {
    log: RwLock<DecisionLog>,
    capacity: Option<usize>,
}

impl InMemoryDecisionMemory {
    pub fn new() -> Self {
        Self {
            log: RwLock::new(DecisionLog::new(None)),
            capacity: None,
        }
    }

    /// Hide decisions older than `days` from history queries.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.log = RwLock::new(DecisionLog::new(Some(days)));
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

impl Default for InMemoryDecisionMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DecisionMemory for InMemoryDecisionMemory {
    async fn store_decision(&self, record: &DecisionRecord) -> Result<(), MemoryError> {
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        log.append(record.clone());
        if let Some(capacity) = self.capacity {
            log.evict_to(capacity);
        }
        debug!("Stored decision {} ({} in memory)", record.id, log.len());
        Ok(())
    }

    async fn record_outcome(&self, decision_id: &str, success: bool) -> Result<(), MemoryError> {
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        if !log.contains(decision_id) {
            return Err(MemoryError::UnknownDecision(decision_id.to_string()));
        }
        log.set_outcome(decision_id, success);
        Ok(())
    }

    async fn get_decision_history(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<DecisionRecord>, MemoryError> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        Ok(log.history(limit, Utc::now()))
    }

    async fn get_health_status(&self) -> MemoryHealth {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        let health = MemoryHealth::healthy("in-memory", log.visible_count(Utc::now()));
        match self.capacity {
            Some(capacity) => health.with_capacity(capacity),
            None => health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fixtures::{record, recent};
    use chrono::Duration;
    use hive_domain::{DecisionType, Recommendation};

    #[tokio::test]
    async fn test_store_and_read_back() {
        let memory = InMemoryDecisionMemory::new();
        memory.store_decision(&recent("d1", "expand")).await.unwrap();
        memory.store_decision(&recent("d2", "hold")).await.unwrap();

        let history = memory.get_decision_history(None).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
        assert!(history.iter().all(|r| r.success.is_none()));
    }

    #[tokio::test]
    async fn test_outcome_does_not_touch_stored_record() {
        let memory = InMemoryDecisionMemory::new();
        let original = recent("d1", "expand");
        memory.store_decision(&original).await.unwrap();
        memory.record_outcome("d1", true).await.unwrap();

        let history = memory.get_decision_history(None).await.unwrap();
        assert_eq!(history[0].success, Some(true));
        assert_eq!(history[0].content, original.content);
    }

    #[tokio::test]
    async fn test_outcome_for_unknown_decision() {
        let memory = InMemoryDecisionMemory::new();
        assert_eq!(
            memory.record_outcome("missing", true).await,
            Err(MemoryError::UnknownDecision("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_retention_window() {
        let memory = InMemoryDecisionMemory::new().with_retention_days(7);
        memory
            .store_decision(&record("old", "expand", Utc::now() - Duration::days(8)))
            .await
            .unwrap();
        memory.store_decision(&recent("new", "expand")).await.unwrap();

        let history = memory.get_decision_history(None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "new");
        assert_eq!(memory.get_health_status().await.record_count, 1);
    }

    #[tokio::test]
    async fn test_capacity_forgets_oldest() {
        let memory = InMemoryDecisionMemory::new().with_capacity(2);
        for id in ["d1", "d2", "d3"] {
            memory.store_decision(&recent(id, "expand")).await.unwrap();
        }

        let history = memory.get_decision_history(None).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "d3"]);

        let health = memory.get_health_status().await;
        assert!(health.healthy);
        assert_eq!(health.capacity, Some(2));
        assert_eq!(health.record_count, 2);
    }

    #[tokio::test]
    async fn test_find_similar_by_winning_value() {
        let memory = InMemoryDecisionMemory::new();
        memory.store_decision(&recent("d1", "expand")).await.unwrap();
        memory.store_decision(&recent("d2", "hold")).await.unwrap();

        let similar = memory
            .find_similar_decisions(DecisionType::Strategic, &Recommendation::label("expand"))
            .await
            .unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].id, "d1");

        let none = memory
            .find_similar_decisions(DecisionType::Emergency, &Recommendation::label("expand"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
