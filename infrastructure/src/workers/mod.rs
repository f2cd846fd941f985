//! Scripted worker agents and the scenario files that describe them.

mod scenario;
mod scripted;

pub use scenario::{Scenario, ScenarioError};
pub use scripted::{ScriptedWorker, WorkerScript};
