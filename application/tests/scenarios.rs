//! End-to-end voting scenarios through the public engine and authority API.

use async_trait::async_trait;
use hive_application::{
    ConsensusConfig, CoordinatingAuthority, DecisionMemory, MemoryError, MemoryHealth,
    VotingEngine, WorkerAgent, WorkerError,
};
use hive_domain::{
    AgentId, AgentReport, AgentStatus, Ballot, DecisionRecord, Recommendation, RoundState,
    TieResolution, TopicContext, TopicKind, Urgency, VoteOption, VotingError, VotingTopic,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct LabelWorker {
    id: AgentId,
    label: &'static str,
    confidence: f64,
}

impl LabelWorker {
    fn new(id: &str, label: &'static str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            id: AgentId::new(id),
            label,
            confidence,
        })
    }
}

#[async_trait]
impl WorkerAgent for LabelWorker {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn status(&self) -> AgentStatus {
        AgentStatus::Active
    }

    async fn generate_report(
        &self,
        _topic: &str,
        _context: &TopicContext,
    ) -> Result<AgentReport, WorkerError> {
        Ok(AgentReport::new(
            self.id.clone(),
            Recommendation::label(self.label),
            self.confidence,
            "",
        ))
    }
}

#[derive(Default)]
struct VecMemory {
    records: Mutex<Vec<DecisionRecord>>,
}

#[async_trait]
impl DecisionMemory for VecMemory {
    async fn store_decision(&self, record: &DecisionRecord) -> Result<(), MemoryError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn record_outcome(&self, decision_id: &str, success: bool) -> Result<(), MemoryError> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == decision_id) {
            Some(record) => {
                record.success = Some(success);
                Ok(())
            }
            None => Err(MemoryError::UnknownDecision(decision_id.to_string())),
        }
    }

    async fn get_decision_history(
        &self,
        _limit: Option<usize>,
    ) -> Result<Vec<DecisionRecord>, MemoryError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn get_health_status(&self) -> MemoryHealth {
        MemoryHealth::healthy("vec", self.records.lock().unwrap().len())
    }
}

fn topic(options: &[&str]) -> VotingTopic {
    VotingTopic::new(
        "topic-1",
        TopicKind::Decision,
        "What should we do next?",
        options
            .iter()
            .map(|id| VoteOption::labeled(*id, *id))
            .collect(),
    )
}

fn voters(ids: &[&str]) -> Vec<AgentId> {
    ids.iter().map(|id| AgentId::new(*id)).collect()
}

const LONG: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn scenario_a_unanimous_weighted_majority() {
    let engine = VotingEngine::default();
    let round = engine
        .start_voting(
            topic(&["automate-follow-ups", "hire-sdr"]),
            voters(&["a1", "a2", "a3", "a4"]),
            LONG,
        )
        .unwrap();

    for (agent, confidence) in [("a1", 0.85), ("a2", 0.82), ("a3", 0.88), ("a4", 0.79)] {
        engine
            .cast_vote(&round, Ballot::new(agent, "automate-follow-ups", confidence))
            .await
            .unwrap();
    }

    let outcome = engine.close_voting(&round).await.unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.winner.id, "automate-follow-ups");
    assert!((result.winner_tally() - 3.34).abs() < 1e-9);
    assert_eq!(result.participation.participation_rate, 1.0);
    assert_eq!(result.participation.actual_voters, 4);

    // tally conservation
    let expected: f64 = result.votes.iter().map(|v| v.confidence * v.weight).sum();
    assert!((result.voting_stats.total_tally() - expected).abs() < 1e-12);
}

#[tokio::test(start_paused = true)]
async fn scenario_b_deferred_below_quorum_at_deadline() {
    let engine = VotingEngine::default();
    let round = engine
        .start_voting(
            topic(&["expand", "hold"]),
            voters(&["a1", "a2", "a3", "a4", "a5", "a6"]),
            Duration::from_secs(30),
        )
        .unwrap();

    engine
        .cast_vote(&round, Ballot::new("a1", "expand", 0.9))
        .await
        .unwrap();
    engine
        .cast_vote(&round, Ballot::new("a2", "expand", 0.9))
        .await
        .unwrap();

    let outcome = engine.wait_for_close(&round).await.unwrap();
    assert!(outcome.is_deferred());
    assert!(outcome.result().is_none());
    assert_eq!(
        engine.get_voting_status(&round).unwrap().state,
        RoundState::Deferred
    );
}

#[tokio::test]
async fn scenario_c_tie_falls_back_to_first_listed() {
    let engine = VotingEngine::default();
    let round = engine
        .start_voting(
            topic(&["email", "social"]),
            voters(&["a1", "a2", "a3", "a4"]),
            LONG,
        )
        .unwrap();

    for (agent, option) in [("a1", "social"), ("a2", "social"), ("a3", "email"), ("a4", "email")] {
        engine
            .cast_vote(&round, Ballot::new(agent, option, 1.0))
            .await
            .unwrap();
    }

    let result = engine.outcome(&round).unwrap().result().cloned().unwrap();
    assert_eq!(result.voting_stats.tally_for("email"), 2.0);
    assert_eq!(result.voting_stats.tally_for("social"), 2.0);
    assert_eq!(result.winner.id, "email");
    assert_eq!(
        result.tie.map(|t| t.resolution),
        Some(TieResolution::DeterministicFirst)
    );
}

#[tokio::test]
async fn scenario_d_history_scales_vote_weight() {
    let authority =
        CoordinatingAuthority::new(ConsensusConfig::default(), Arc::new(VecMemory::default()));
    for (id, label) in [("x", "expand"), ("y", "expand"), ("z", "expand")] {
        authority.register_agent(LabelWorker::new(id, label, 0.9));
    }

    // ten past decisions X agreed with, nine of them successful
    for i in 0..10 {
        let record = authority
            .make_decision(&format!("Expansion step {}", i), TopicContext::new(), Urgency::Normal)
            .await
            .unwrap();
        authority
            .memory()
            .record_outcome(&record.id, i != 0)
            .await
            .unwrap();
    }

    authority.analyze_historical_patterns().await.unwrap();
    let x = AgentId::new("x");
    assert!((authority.engine().agent_weight(&x) - 0.9).abs() < 1e-12);

    let engine = authority.engine();
    let round = engine
        .start_voting(topic(&["expand", "hold"]), voters(&["x", "w"]), LONG)
        .unwrap();
    engine
        .cast_vote(&round, Ballot::new("x", "expand", 0.8))
        .await
        .unwrap();
    let result = engine.close_voting(&round).await.unwrap();
    let result = result.result().unwrap();
    assert!((result.voting_stats.tally_for("expand") - 0.72).abs() < 1e-12);
}

#[tokio::test]
async fn close_is_idempotent_and_late_votes_are_rejected() {
    let engine = VotingEngine::default();
    let round = engine
        .start_voting(topic(&["expand", "hold"]), voters(&["a1", "a2", "a3"]), LONG)
        .unwrap();
    engine
        .cast_vote(&round, Ballot::new("a1", "hold", 0.6))
        .await
        .unwrap();
    engine
        .cast_vote(&round, Ballot::new("a2", "expand", 0.7))
        .await
        .unwrap();

    let first = engine.close_voting(&round).await.unwrap();
    let late = engine
        .cast_vote(&round, Ballot::new("a3", "hold", 1.0))
        .await;
    assert_eq!(late, Err(VotingError::RoundClosed(round.clone())));

    let second = engine.close_voting(&round).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second.result().unwrap().winner.id, "expand");
}

#[tokio::test]
async fn repeated_runs_pick_the_same_winner() {
    let mut winners = Vec::new();
    for _ in 0..5 {
        let engine = VotingEngine::default();
        let round = engine
            .start_voting(
                topic(&["a", "b", "c"]),
                voters(&["v1", "v2", "v3"]),
                LONG,
            )
            .unwrap();
        for (voter, option, confidence) in [("v1", "b", 0.4), ("v2", "c", 0.9), ("v3", "b", 0.6)] {
            engine
                .cast_vote(&round, Ballot::new(voter, option, confidence))
                .await
                .unwrap();
        }
        let outcome = engine.outcome(&round).unwrap();
        winners.push(outcome.result().unwrap().winner.id.clone());
    }
    assert!(winners.iter().all(|w| w == "b"));
}
