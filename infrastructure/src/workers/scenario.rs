//! Scenario files for the simulation harness.
//!
//! ```toml
//! topic = "Should we expand to the EU market?"
//!
//! [context]
//! budget = 250000
//!
//! [[workers]]
//! id = "analyst"
//! recommendation = "expand"
//! confidence = 0.85
//!
//! [[workers]]
//! id = "finance"
//! recommendation = "hold"
//! confidence = 0.7
//! ```

use super::scripted::{ScriptedWorker, WorkerScript};
use hive_application::WorkerAgent;
use hive_domain::TopicContext;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("could not read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("scenario declares no workers")]
    NoWorkers,

    #[error("worker id '{0}' appears more than once")]
    DuplicateWorker(String),
}

/// A topic plus the scripted workers that will report on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub topic: String,
    #[serde(default)]
    pub context: TopicContext,
    pub workers: Vec<WorkerScript>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let scenario: Scenario = toml::from_str(&content).map_err(|source| ScenarioError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        scenario.check()?;
        Ok(scenario)
    }

    fn check(&self) -> Result<(), ScenarioError> {
        if self.workers.is_empty() {
            return Err(ScenarioError::NoWorkers);
        }
        for (i, worker) in self.workers.iter().enumerate() {
            if self.workers[..i].iter().any(|w| w.id == worker.id) {
                return Err(ScenarioError::DuplicateWorker(worker.id.clone()));
            }
        }
        Ok(())
    }

    /// One scripted worker per entry, in file order.
    pub fn build_workers(&self) -> Vec<Arc<ScriptedWorker>> {
        self.workers
            .iter()
            .cloned()
            .map(|script| Arc::new(ScriptedWorker::new(script)))
            .collect()
    }

    /// Same as [`build_workers`](Self::build_workers), typed for registration.
    pub fn agents(&self) -> Vec<Arc<dyn WorkerAgent>> {
        self.build_workers()
            .into_iter()
            .map(|w| w as Arc<dyn WorkerAgent>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
topic = "Should we expand to the EU market?"

[context]
budget = 250000
region = "eu-west"

[[workers]]
id = "analyst"
recommendation = "expand"
confidence = 0.85

[[workers]]
id = "finance"
recommendation = { action = "hold", quarters = 2 }
confidence = 0.7
status = "busy"
"#;

    #[test]
    fn test_load_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, SCENARIO).unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.topic, "Should we expand to the EU market?");
        assert_eq!(scenario.context["region"], "eu-west");
        assert_eq!(scenario.workers.len(), 2);
        assert_eq!(scenario.workers[1].recommendation["quarters"], 2);

        let agents = scenario.agents();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[1].id().as_str(), "finance");
        assert_eq!(agents[1].status(), hive_domain::AgentStatus::Busy);
    }

    #[test]
    fn test_rejects_duplicate_workers() {
        let scenario: Scenario = toml::from_str(
            r#"
topic = "t"
[[workers]]
id = "a"
recommendation = "x"
[[workers]]
id = "a"
recommendation = "y"
"#,
        )
        .unwrap();
        assert!(matches!(
            scenario.check(),
            Err(ScenarioError::DuplicateWorker(id)) if id == "a"
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.toml")).unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
    }
}
