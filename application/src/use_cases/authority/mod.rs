//! Coordinating Authority use case
//!
//! Runs full decision cycles over a registry of worker agents:
//!
//! | Step                        | Ordinary              | Emergency                     |
//! |-----------------------------|-----------------------|-------------------------------|
//! | 1. Gather reports           | wait for all          | per-agent sub-timeout         |
//! | 2. Derive options           | from reports (≤5)     | fixed three-action set        |
//! | 3. Open round               | decision timeout      | emergency timeout             |
//! | 4. Cast votes from reports  | yes                   | yes, plus the Authority's own |
//! | 5. Close                    | all voted or deadline | force close                   |
//! | 6. Statement + related      | yes                   | yes                           |
//! | 7. Persist or re-queue      | yes                   | yes                           |
//! | 8. Fan out task assignments | yes                   | yes                           |
//!
//! An ordinary round closes as soon as every eligible agent has voted,
//! otherwise at `decision_timeout`, where the quorum check applies. Only an
//! emergency round is force-closed once the votes are in. Records carry the
//! time their round closed, not the time they were written.
//!
//! Deferred decisions (quorum not met) are never persisted as decided; they
//! are surfaced with [`DecisionStatus::Deferred`](hive_domain::DecisionStatus)
//! and kept in a re-queue until retried.
//!
//! # Registry
//!
//! Agents are expected to be registered before any decision cycle starts.
//! Registering while cycles are in flight is safe memory-wise but which
//! cycles see the new agent is unspecified; callers that need a precise
//! cut-over must synchronize externally.

mod health;
mod options;
mod reports;
mod statement;
mod tie_break;
mod types;

pub use options::derive_options;
pub use statement::decision_statement;
pub use tie_break::QueenTieBreaker;
pub use types::{AuthorityError, CollaborationPlan, DeferredDecision, HealthLevel, SwarmHealth};

use crate::config::ConsensusConfig;
use crate::ports::consensus_events::{ConsensusEvent, ConsensusObserver, NoObserver};
use crate::ports::decision_memory::DecisionMemory;
use crate::ports::tie_breaker::TieBreakResolver;
use crate::ports::worker_agent::WorkerAgent;
use crate::use_cases::voting_engine::VotingEngine;
use chrono::Utc;
use hive_domain::{
    AgentId, AgentPattern, AgentReport, AssignmentRole, Ballot, DecisionRecord, DecisionType,
    EmergencySeverity, RoundOutcome, TaskAssignment, TopicContext, TopicKind, Urgency, VoteOption,
    VotingTopic,
};
use reports::gather_reports;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Option ids of the fixed emergency action set, in ballot order.
pub const IMMEDIATE_ACTION: &str = "immediate-action";
pub const ESCALATE: &str = "escalate";
pub const CONTAIN: &str = "contain";

/// How many similar past decisions a statement references
const MAX_RELATED: usize = 3;

/// The single orchestrating role of the swarm.
pub struct CoordinatingAuthority<M: DecisionMemory + 'static> {
    config: ConsensusConfig,
    engine: VotingEngine,
    memory: Arc<M>,
    observer: Arc<dyn ConsensusObserver>,
    /// Registration order is the report and assignment order
    agents: RwLock<Vec<Arc<dyn WorkerAgent>>>,
    deferred: Mutex<Vec<DeferredDecision>>,
    next_decision: AtomicU64,
}

/// Inputs of one decision cycle, kept so a deferred cycle can be retried.
struct Cycle {
    decision_type: DecisionType,
    topic: String,
    context: TopicContext,
    urgency: Urgency,
    severity: Option<EmergencySeverity>,
}

impl<M: DecisionMemory + 'static> CoordinatingAuthority<M> {
    pub fn new(config: ConsensusConfig, memory: Arc<M>) -> Self {
        let observer: Arc<dyn ConsensusObserver> = Arc::new(NoObserver);
        Self {
            engine: Self::build_engine(&config, Arc::clone(&observer)),
            config,
            memory,
            observer,
            agents: RwLock::new(Vec::new()),
            deferred: Mutex::new(Vec::new()),
            next_decision: AtomicU64::new(1),
        }
    }

    /// Attach an observer for engine and decision events.
    ///
    /// Rebuilds the Voting Engine, so call it before any round is opened.
    pub fn with_observer(mut self, observer: Arc<dyn ConsensusObserver>) -> Self {
        self.engine = Self::build_engine(&self.config, Arc::clone(&observer));
        self.observer = observer;
        self
    }

    fn build_engine(config: &ConsensusConfig, observer: Arc<dyn ConsensusObserver>) -> VotingEngine {
        let tie_breaker: Option<Arc<dyn TieBreakResolver>> = if config.tie_breaker.authority_decides()
        {
            Some(Arc::new(QueenTieBreaker))
        } else {
            None
        };
        VotingEngine::with_parts(config.engine_settings(), observer, tie_breaker)
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn engine(&self) -> &VotingEngine {
        &self.engine
    }

    pub fn memory(&self) -> &Arc<M> {
        &self.memory
    }

    /// Derive agent weights from history. Call once before the first cycle.
    pub async fn initialize(&self) -> Result<Vec<AgentPattern>, AuthorityError> {
        info!("Initializing coordinating authority '{}'", self.config.authority_id);
        self.analyze_historical_patterns().await
    }

    // ==================== Registry ====================

    /// Add an agent, replacing any registered agent with the same id.
    pub fn register_agent(&self, agent: Arc<dyn WorkerAgent>) {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        let id = agent.id().clone();
        match agents.iter().position(|a| a.id() == &id) {
            Some(i) => {
                debug!("Replacing registered agent {}", id);
                agents[i] = agent;
            }
            None => {
                info!("Registered agent {}", id);
                agents.push(agent);
            }
        }
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.registered().iter().map(|a| a.id().clone()).collect()
    }

    fn registered(&self) -> Vec<Arc<dyn WorkerAgent>> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ==================== Decision Cycles ====================

    /// Run an ordinary decision cycle on `topic`.
    pub async fn make_decision(
        &self,
        topic: &str,
        context: TopicContext,
        urgency: Urgency,
    ) -> Result<DecisionRecord, AuthorityError> {
        self.run_cycle(Cycle {
            decision_type: DecisionType::Strategic,
            topic: topic.to_string(),
            context,
            urgency,
            severity: None,
        })
        .await
    }

    /// Run a compressed decision cycle over the fixed emergency action set.
    pub async fn handle_emergency(
        &self,
        situation: &str,
        severity: EmergencySeverity,
        mut context: TopicContext,
    ) -> Result<DecisionRecord, AuthorityError> {
        context.insert(
            "severity".to_string(),
            Value::String(severity.as_str().to_string()),
        );
        self.run_cycle(Cycle {
            decision_type: DecisionType::Emergency,
            topic: situation.to_string(),
            context,
            urgency: urgency_for(severity),
            severity: Some(severity),
        })
        .await
    }

    async fn run_cycle(&self, cycle: Cycle) -> Result<DecisionRecord, AuthorityError> {
        let agents = self.registered();
        if agents.is_empty() {
            return Err(AuthorityError::NoAgentsRegistered);
        }

        let emergency = cycle.decision_type == DecisionType::Emergency;
        let decision_id = self.next_decision_id();
        info!(
            "{} {} on '{}' with {} agents",
            if emergency { "Emergency" } else { "Decision" },
            decision_id,
            cycle.topic,
            agents.len()
        );

        // Step 1: reports
        let report_timeout = emergency.then_some(self.config.emergency_report_timeout);
        let gathered = gather_reports(&agents, &cycle.topic, &cycle.context, report_timeout).await;
        if gathered.reports.is_empty() {
            warn!("No reports collected for '{}', no round opened", cycle.topic);
            return Err(AuthorityError::NoReportsCollected(cycle.topic));
        }

        // Step 2: options
        let options = if emergency {
            emergency_options()
        } else {
            derive_options(&gathered.reports, self.config.max_options)
        };
        let kind = if emergency {
            TopicKind::Action
        } else {
            TopicKind::Decision
        };
        let topic = VotingTopic::new(decision_id.clone(), kind, cycle.topic.clone(), options)
            .with_context(cycle.context.clone());

        // Step 3: round
        let authority_votes = emergency && self.config.tie_breaker.authority_decides();
        let mut eligible: Vec<AgentId> = agents.iter().map(|a| a.id().clone()).collect();
        if authority_votes {
            eligible.push(AgentId::new(self.config.authority_id.clone()));
        }
        let timeout = if emergency {
            self.config.emergency_timeout
        } else {
            self.config.decision_timeout
        };
        let round_id = self.engine.start_voting(topic.clone(), eligible, timeout)?;

        // Step 4: votes on behalf of the reporting agents
        for report in &gathered.reports {
            let Some(option) = topic.option_for(&report.recommendation) else {
                debug!(
                    "Report from {} matches no option, not voting",
                    report.agent_id
                );
                continue;
            };
            let ballot = Ballot::new(report.agent_id.clone(), option.id.clone(), report.confidence)
                .with_reasoning(report.reasoning.clone());
            if let Err(e) = self.engine.cast_vote(&round_id, ballot).await {
                warn!("Vote of {} not counted: {}", report.agent_id, e);
            }
        }

        if authority_votes {
            let ballot = Ballot::new(self.config.authority_id.clone(), IMMEDIATE_ACTION, 1.0)
                .with_weight_multiplier(self.config.emergency_weight_multiplier)
                .with_reasoning("Emergency: the coordinating authority favours immediate action");
            if let Err(e) = self.engine.cast_vote(&round_id, ballot).await {
                warn!("Authority vote not counted: {}", e);
            }
        }

        // Step 5: close
        let outcome = if emergency {
            self.engine.close_voting(&round_id).await?
        } else {
            self.engine.wait_for_close(&round_id).await?
        };
        let closed_at = Utc::now();
        self.engine.release_round(&round_id);

        // Step 6: statement
        let related = match outcome.result() {
            Some(result) => self.related_decisions(cycle.decision_type, &result.winner).await,
            None => Vec::new(),
        };
        let heading = match cycle.severity {
            Some(severity) => format!("Emergency response ({})", severity),
            None => "Decision".to_string(),
        };
        let content = decision_statement(&heading, &cycle.topic, &outcome, &related);

        let record = DecisionRecord {
            id: decision_id,
            decision_type: cycle.decision_type,
            topic: cycle.topic.clone(),
            content,
            outcome: outcome.clone(),
            urgency: cycle.urgency,
            related_decisions: related,
            timestamp: closed_at,
            success: None,
        };

        // Step 7: persist or re-queue
        let RoundOutcome::Closed(result) = &outcome else {
            self.defer(&record, cycle);
            return Ok(record);
        };

        self.memory.store_decision(&record).await?;
        info!("{}", record.content);
        let event = if emergency {
            ConsensusEvent::EmergencyHandled {
                record: record.clone(),
            }
        } else {
            ConsensusEvent::DecisionMade {
                record: record.clone(),
            }
        };
        self.observer.on_event(&event);

        // Step 8: assignments
        self.assign_tasks(&record.id, &result.winner, &gathered.reports, &agents)
            .await;

        Ok(record)
    }

    fn next_decision_id(&self) -> String {
        let seq = self.next_decision.fetch_add(1, Ordering::Relaxed);
        format!("decision-{}-{}", Utc::now().timestamp_millis(), seq)
    }

    /// Ids of the most recent similar decisions, oldest first.
    async fn related_decisions(&self, decision_type: DecisionType, winner: &VoteOption) -> Vec<String> {
        match self
            .memory
            .find_similar_decisions(decision_type, &winner.value)
            .await
        {
            Ok(similar) => {
                let skip = similar.len().saturating_sub(MAX_RELATED);
                similar.into_iter().skip(skip).map(|r| r.id).collect()
            }
            Err(e) => {
                warn!("Could not look up related decisions: {}", e);
                Vec::new()
            }
        }
    }

    /// Hand out the decision to the agents: those whose report backed the
    /// winner lead, every other available agent supports.
    async fn assign_tasks(
        &self,
        decision_id: &str,
        winner: &VoteOption,
        reports: &[AgentReport],
        agents: &[Arc<dyn WorkerAgent>],
    ) {
        let assignments: Vec<(Arc<dyn WorkerAgent>, TaskAssignment)> = agents
            .iter()
            .filter_map(|agent| {
                let backed_winner = reports.iter().any(|r| {
                    &r.agent_id == agent.id() && r.recommendation.structurally_equal(&winner.value)
                });
                let role = if backed_winner {
                    AssignmentRole::Lead
                } else if agent.status().is_available() {
                    AssignmentRole::Support
                } else {
                    return None;
                };
                let assignment = TaskAssignment::new(
                    decision_id,
                    agent.id().clone(),
                    winner.value.clone(),
                    role,
                );
                Some((Arc::clone(agent), assignment))
            })
            .collect();

        let results = futures::future::join_all(
            assignments
                .iter()
                .map(|(agent, assignment)| agent.assign_task(assignment)),
        )
        .await;

        for ((agent, assignment), result) in assignments.iter().zip(results) {
            match result {
                Ok(()) => debug!(
                    "Assigned {} to {} as {:?}",
                    decision_id,
                    agent.id(),
                    assignment.role
                ),
                Err(e) => warn!("Assignment of {} to {} failed: {}", decision_id, agent.id(), e),
            }
        }
    }

    // ==================== Deferred Queue ====================

    fn deferred_queue(&self) -> MutexGuard<'_, Vec<DeferredDecision>> {
        self.deferred.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn defer(&self, record: &DecisionRecord, cycle: Cycle) {
        warn!("{}", record.content);
        self.deferred_queue().push(DeferredDecision {
            id: record.id.clone(),
            decision_type: cycle.decision_type,
            topic: cycle.topic,
            context: cycle.context,
            urgency: cycle.urgency,
            severity: cycle.severity,
            participation: record.outcome.participation(),
            deferred_at: record.timestamp,
        });
    }

    /// Decisions waiting for another round, oldest first.
    pub fn deferred_decisions(&self) -> Vec<DeferredDecision> {
        self.deferred_queue().clone()
    }

    /// Take a deferred decision off the queue and run its cycle again.
    ///
    /// If it is deferred again it goes back on the queue under the new
    /// record's id.
    pub async fn retry_deferred(&self, decision_id: &str) -> Result<DecisionRecord, AuthorityError> {
        let entry = {
            let mut queue = self.deferred_queue();
            let index = queue
                .iter()
                .position(|d| d.id == decision_id)
                .ok_or_else(|| AuthorityError::UnknownDeferred(decision_id.to_string()))?;
            queue.remove(index)
        };

        info!("Retrying deferred decision {} on '{}'", entry.id, entry.topic);
        self.run_cycle(Cycle {
            decision_type: entry.decision_type,
            topic: entry.topic,
            context: entry.context,
            urgency: entry.urgency,
            severity: entry.severity,
        })
        .await
    }

    // ==================== Pattern Feedback ====================

    /// Re-derive agent weights from decision history.
    ///
    /// Every agent with a positive success rate gets that rate as its
    /// standing weight. The authority's own emergency votes are mined too
    /// but never reweigh it; its weight stays the fixed base the emergency
    /// multiplier applies to. Open rounds keep the weights they snapshotted
    /// at start, so this is safe to run between or alongside cycles.
    pub async fn analyze_historical_patterns(&self) -> Result<Vec<AgentPattern>, AuthorityError> {
        let history = self.memory.get_decision_history(None).await?;
        let patterns = self.memory.analyze_decision_patterns(&history);

        for pattern in &patterns {
            if pattern.agent_id.as_str() == self.config.authority_id {
                continue;
            }
            if pattern.success_rate > 0.0 {
                self.engine
                    .set_agent_weight(&pattern.agent_id, pattern.success_rate.min(1.0));
            }
        }

        info!(
            "Analyzed {} past decisions, {} agent patterns",
            history.len(),
            patterns.len()
        );
        Ok(patterns)
    }
}

fn emergency_options() -> Vec<VoteOption> {
    vec![
        VoteOption::labeled(IMMEDIATE_ACTION, "Act immediately to resolve the situation"),
        VoteOption::labeled(ESCALATE, "Escalate to human operators"),
        VoteOption::labeled(CONTAIN, "Contain the impact and keep monitoring"),
    ]
}

fn urgency_for(severity: EmergencySeverity) -> Urgency {
    match severity {
        EmergencySeverity::Low => Urgency::Normal,
        EmergencySeverity::Medium => Urgency::High,
        EmergencySeverity::High | EmergencySeverity::Critical => Urgency::Critical,
    }
}
