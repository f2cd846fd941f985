//! Concurrent report gathering from worker agents.

use crate::ports::worker_agent::{WorkerAgent, WorkerError};
use hive_domain::{AgentId, AgentReport, TopicContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Reports that arrived, plus the agents that failed to deliver one.
pub(super) struct Gathered {
    /// In registry order
    pub reports: Vec<AgentReport>,
    pub failed: Vec<AgentId>,
}

/// Ask every agent for a report on `topic` concurrently.
///
/// Without a `timeout` this waits for every call to settle. With one, each
/// call gets its own deadline and late agents are dropped, not retried.
/// A failing agent is excluded; it never aborts the gathering.
pub(super) async fn gather_reports(
    agents: &[Arc<dyn WorkerAgent>],
    topic: &str,
    context: &TopicContext,
    timeout: Option<Duration>,
) -> Gathered {
    info!(
        "Requesting reports from {} agents{}",
        agents.len(),
        timeout
            .map(|t| format!(" (timeout {:?})", t))
            .unwrap_or_default()
    );

    let mut join_set = JoinSet::new();

    for (index, agent) in agents.iter().enumerate() {
        let agent = Arc::clone(agent);
        let topic = topic.to_string();
        let context = context.clone();

        join_set.spawn(async move {
            let call = agent.generate_report(&topic, &context);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or(Err(WorkerError::Timeout)),
                None => call.await,
            };
            (index, agent.id().clone(), result)
        });
    }

    let mut collected: Vec<(usize, AgentReport)> = Vec::new();
    let mut failed: Vec<(usize, AgentId)> = Vec::new();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, agent_id, Ok(mut report))) => {
                debug!(
                    "Agent {} recommends '{}' ({:.2})",
                    agent_id, report.recommendation, report.confidence
                );
                // the registry id is the voter identity
                report.agent_id = agent_id;
                collected.push((index, report));
            }
            Ok((index, agent_id, Err(e))) => {
                warn!("Agent {} excluded from this round: {}", agent_id, e);
                failed.push((index, agent_id));
            }
            Err(e) => {
                warn!("Task join error: {}", e);
            }
        }
    }

    collected.sort_by_key(|(index, _)| *index);
    failed.sort_by_key(|(index, _)| *index);

    Gathered {
        reports: collected.into_iter().map(|(_, report)| report).collect(),
        failed: failed.into_iter().map(|(_, id)| id).collect(),
    }
}
