//! Worker agents that answer from a script instead of reasoning.
//!
//! Used by the simulation harness to drive decision cycles end to end
//! without real workers behind them.

use async_trait::async_trait;
use hive_application::{WorkerAgent, WorkerError};
use hive_domain::{AgentId, AgentReport, AgentStatus, Recommendation, TaskAssignment, TopicContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// How a scripted worker behaves.
///
/// # Example
///
/// ```toml
/// [[workers]]
/// id = "analyst"
/// recommendation = "expand"      # a label, or a table for a structured value
/// confidence = 0.8
/// reasoning = "Demand is up"
/// delay_ms = 200
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerScript {
    pub id: String,
    /// A string becomes a label; anything else a structured recommendation
    pub recommendation: Value,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    /// Simulated think time before the report is returned
    #[serde(default)]
    pub delay_ms: u64,
    /// Fail every report request
    #[serde(default)]
    pub fail: bool,
    #[serde(default = "default_status")]
    pub status: AgentStatus,
}

fn default_confidence() -> f64 {
    0.5
}

fn default_status() -> AgentStatus {
    AgentStatus::Active
}

impl WorkerScript {
    pub fn new(id: impl Into<String>, recommendation: Value, confidence: f64) -> Self {
        Self {
            id: id.into(),
            recommendation,
            confidence,
            reasoning: String::new(),
            delay_ms: 0,
            fail: false,
            status: default_status(),
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match &self.recommendation {
            Value::String(label) => Recommendation::label(label.clone()),
            other => Recommendation::structured(other.clone()),
        }
    }
}

/// A [`WorkerAgent`] that replays its [`WorkerScript`].
pub struct ScriptedWorker {
    id: AgentId,
    script: WorkerScript,
    assignments: Mutex<Vec<TaskAssignment>>,
}

impl ScriptedWorker {
    pub fn new(script: WorkerScript) -> Self {
        Self {
            id: AgentId::new(script.id.clone()),
            script,
            assignments: Mutex::new(Vec::new()),
        }
    }

    /// Tasks handed to this worker so far.
    pub fn assignments(&self) -> Vec<TaskAssignment> {
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WorkerAgent for ScriptedWorker {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn status(&self) -> AgentStatus {
        self.script.status
    }

    async fn generate_report(
        &self,
        topic: &str,
        _context: &TopicContext,
    ) -> Result<AgentReport, WorkerError> {
        if self.script.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.script.delay_ms)).await;
        }
        if self.script.fail {
            return Err(WorkerError::Failed(format!(
                "{} is scripted to fail",
                self.id
            )));
        }

        debug!("Scripted worker {} reporting on '{}'", self.id, topic);
        Ok(AgentReport::new(
            self.id.clone(),
            self.script.recommendation(),
            self.script.confidence,
            self.script.reasoning.clone(),
        ))
    }

    async fn assign_task(&self, assignment: &TaskAssignment) -> Result<(), WorkerError> {
        info!(
            "{} takes {:?} role for decision {}",
            self.id, assignment.role, assignment.decision_id
        );
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(assignment.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_domain::AssignmentRole;
    use serde_json::json;

    #[tokio::test]
    async fn test_reports_scripted_label() {
        let worker = ScriptedWorker::new(WorkerScript::new("analyst", json!("expand"), 0.8));
        let report = worker
            .generate_report("Expand?", &TopicContext::new())
            .await
            .unwrap();
        assert_eq!(report.agent_id, AgentId::new("analyst"));
        assert_eq!(report.recommendation, Recommendation::label("expand"));
        assert_eq!(report.confidence, 0.8);
    }

    #[tokio::test]
    async fn test_structured_recommendation() {
        let script = WorkerScript::new("planner", json!({"action": "hire", "count": 2}), 0.6);
        let worker = ScriptedWorker::new(script);
        let report = worker
            .generate_report("Staffing", &TopicContext::new())
            .await
            .unwrap();
        assert_eq!(
            report.recommendation,
            Recommendation::structured(json!({"count": 2, "action": "hire"}))
        );
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mut script = WorkerScript::new("flaky", json!("expand"), 0.8);
        script.fail = true;
        let worker = ScriptedWorker::new(script);
        let result = worker.generate_report("Expand?", &TopicContext::new()).await;
        assert!(matches!(result, Err(WorkerError::Failed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_observed() {
        let mut script = WorkerScript::new("slow", json!("expand"), 0.8);
        script.delay_ms = 5_000;
        let worker = ScriptedWorker::new(script);

        let started = tokio::time::Instant::now();
        worker
            .generate_report("Expand?", &TopicContext::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_records_assignments() {
        let worker = ScriptedWorker::new(WorkerScript::new("analyst", json!("expand"), 0.8));
        let assignment = TaskAssignment::new(
            "decision-1",
            AgentId::new("analyst"),
            Recommendation::label("expand"),
            AssignmentRole::Lead,
        );
        worker.assign_task(&assignment).await.unwrap();
        let recorded = worker.assignments();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].is_lead());
    }

    #[test]
    fn test_script_defaults_from_toml() {
        let script: WorkerScript = toml::from_str(
            r#"
id = "scout"
recommendation = "hold"
"#,
        )
        .unwrap();
        assert_eq!(script.confidence, 0.5);
        assert_eq!(script.status, AgentStatus::Active);
        assert!(!script.fail);
        assert_eq!(script.recommendation(), Recommendation::label("hold"));
    }
}
