//! Auxiliary operations over the agent registry: swarm health and
//! collaboration. Neither is on the consensus-critical path.

use super::CoordinatingAuthority;
use super::reports::gather_reports;
use super::types::{CollaborationPlan, HealthLevel, SwarmHealth};
use crate::ports::decision_memory::DecisionMemory;
use crate::ports::worker_agent::WorkerAgent;
use hive_domain::{AgentId, AgentStatus, TopicContext};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

impl<M: DecisionMemory + 'static> CoordinatingAuthority<M> {
    /// Summarize agent availability, open rounds, the deferred queue and
    /// memory health.
    ///
    /// The swarm is critical when it cannot reach quorum with the agents
    /// available right now, or when decision memory is unhealthy. It is
    /// degraded when any agent is in error or offline, or decisions are
    /// waiting in the re-queue.
    pub async fn monitor_swarm_health(&self) -> SwarmHealth {
        let agents = self.registered();

        let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut available = 0;
        let mut troubled = 0;
        for agent in &agents {
            let status = agent.status();
            *status_counts.entry(status.as_str().to_string()).or_default() += 1;
            if status.is_available() {
                available += 1;
            }
            if matches!(status, AgentStatus::Error | AgentStatus::Offline) {
                troubled += 1;
            }
        }

        let active_rounds = self.engine.active_rounds().len();
        let deferred_decisions = self.deferred_queue().len();
        let memory = self.memory.get_health_status().await;

        let overall = if agents.is_empty()
            || !self.config.quorum().is_satisfied(available, agents.len())
            || !memory.healthy
        {
            HealthLevel::Critical
        } else if troubled > 0 || deferred_decisions > 0 {
            HealthLevel::Degraded
        } else {
            HealthLevel::Healthy
        };

        if overall != HealthLevel::Healthy {
            warn!(
                "Swarm health {}: {} of {} agents available, {} deferred decisions",
                overall,
                available,
                agents.len(),
                deferred_decisions
            );
        }

        SwarmHealth {
            total_agents: agents.len(),
            available_agents: available,
            status_counts,
            active_rounds,
            deferred_decisions,
            memory,
            overall,
        }
    }

    /// Ask the named agents for their take on `task` and rank the answers.
    ///
    /// Unknown ids are reported in the plan rather than failing it. Each
    /// agent gets the ordinary decision timeout.
    pub async fn coordinate_collaboration(
        &self,
        agent_ids: &[AgentId],
        task: &str,
        context: TopicContext,
    ) -> CollaborationPlan {
        let registered = self.registered();

        let mut participants: Vec<Arc<dyn WorkerAgent>> = Vec::new();
        let mut missing = Vec::new();
        for id in agent_ids {
            match registered.iter().find(|a| a.id() == id) {
                Some(agent) if !participants.iter().any(|p| p.id() == id) => {
                    participants.push(Arc::clone(agent));
                }
                Some(_) => {}
                None => missing.push(id.clone()),
            }
        }

        info!(
            "Collaboration on '{}' with {} agents ({} unknown)",
            task,
            participants.len(),
            missing.len()
        );

        let gathered = gather_reports(
            &participants,
            task,
            &context,
            Some(self.config.decision_timeout),
        )
        .await;

        let mut contributions = gathered.reports;
        // stable: equal confidence keeps the requested order
        contributions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let lead = contributions.first().map(|r| r.agent_id.clone());

        CollaborationPlan {
            task: task.to_string(),
            contributions,
            lead,
            missing,
            failed: gathered.failed,
        }
    }
}
