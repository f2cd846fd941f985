//! Voting Engine
//!
//! Runs independent, time-bounded voting rounds concurrently. Each round is
//! guarded by its own lock; rounds never contend with each other except for
//! the brief registry lookups.
//!
//! # Closing
//!
//! A round closes on whichever comes first: every eligible voter has voted,
//! the deadline timer fires, or a caller force-closes it. All three paths go
//! through [`VotingEngine::close_voting`], which is idempotent: the first
//! call seals and tallies, later calls return the cached outcome.
//!
//! Sealing, tie resolution and completion run on a spawned task. A closer
//! that stops waiting halfway (for example a `cast_vote` under a timeout)
//! does not leave the round in `CLOSING`. If that task itself dies, the
//! next closer completes the sealed round with the first-listed rule.
//!
//! ```text
//! start_voting ──▶ OPEN ──cast_vote──▶ OPEN ──(all voted | deadline | close_voting)
//!                                              │
//!                                          CLOSING ──(tie? ask resolver, bounded by grace)
//!                                              │
//!                                 CLOSED(MajorityResult) | DEFERRED(Participation)
//! ```
//!
//! Waiters subscribe to a per-round `watch` channel, so a waiter that
//! arrives after the close still observes the outcome.
//!
//! Closed rounds stay queryable until released with
//! [`VotingEngine::release_round`] or [`VotingEngine::prune_closed`].

use crate::config::EngineSettings;
use crate::ports::consensus_events::{ConsensusEvent, ConsensusObserver, NoObserver};
use crate::ports::tie_breaker::TieBreakResolver;
use hive_domain::quorum::{CastReceipt, DEFAULT_AGENT_WEIGHT, SealedRound};
use hive_domain::{
    AgentId, Ballot, RoundId, RoundOutcome, RoundSnapshot, VoteOption, VotingError, VotingRound,
    VotingTopic,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-round state shared between callers and the deadline timer.
struct RoundHandle {
    round: Mutex<VotingRound>,
    /// Serializes closers so sealing and tie resolution happen once
    close_gate: tokio::sync::Mutex<()>,
    /// Kept until completion so an interrupted close can be finished
    sealed: Mutex<Option<SealedRound>>,
    outcome: watch::Sender<Option<RoundOutcome>>,
    timer: CancellationToken,
}

impl RoundHandle {
    fn round(&self) -> MutexGuard<'_, VotingRound> {
        self.round.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sealed(&self) -> MutexGuard<'_, Option<SealedRound>> {
        self.sealed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached_outcome(&self) -> Option<RoundOutcome> {
        self.outcome.borrow().clone()
    }
}

struct EngineInner {
    rounds: RwLock<HashMap<RoundId, Arc<RoundHandle>>>,
    weights: RwLock<HashMap<AgentId, f64>>,
    settings: EngineSettings,
    tie_breaker: Option<Arc<dyn TieBreakResolver>>,
    observer: Arc<dyn ConsensusObserver>,
    next_round: AtomicU64,
    shutdown: CancellationToken,
}

/// Runs weighted voting rounds.
///
/// Cheap to clone; clones share rounds and the weight table.
#[derive(Clone)]
pub struct VotingEngine {
    inner: Arc<EngineInner>,
}

impl VotingEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_parts(settings, Arc::new(NoObserver), None)
    }

    pub fn with_parts(
        settings: EngineSettings,
        observer: Arc<dyn ConsensusObserver>,
        tie_breaker: Option<Arc<dyn TieBreakResolver>>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                rounds: RwLock::new(HashMap::new()),
                weights: RwLock::new(HashMap::new()),
                settings,
                tie_breaker,
                observer,
                next_round: AtomicU64::new(1),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    // ==================== Rounds ====================

    /// Open a round on `topic` that closes at the latest after `timeout`.
    ///
    /// Standing weights of the eligible voters are snapshotted now; later
    /// weight changes only affect rounds opened afterwards. The deadline
    /// timer is only armed when called inside a Tokio runtime.
    pub fn start_voting(
        &self,
        topic: VotingTopic,
        eligible_voters: impl IntoIterator<Item = AgentId>,
        timeout: Duration,
    ) -> Result<RoundId, VotingError> {
        let eligible: Vec<AgentId> = eligible_voters.into_iter().collect();
        let weights = {
            let table = self.inner.weights.read().unwrap_or_else(PoisonError::into_inner);
            eligible
                .iter()
                .filter_map(|agent| table.get(agent).map(|w| (agent.clone(), *w)))
                .collect::<HashMap<_, _>>()
        };

        let seq = self.inner.next_round.fetch_add(1, Ordering::Relaxed);
        let round_id = RoundId::new(format!("round-{}", seq));
        let round = VotingRound::open(
            round_id.clone(),
            topic,
            eligible,
            weights,
            self.inner.settings.quorum,
            timeout,
        )?;

        let (outcome, _) = watch::channel(None);
        let handle = Arc::new(RoundHandle {
            round: Mutex::new(round),
            close_gate: tokio::sync::Mutex::new(()),
            sealed: Mutex::new(None),
            outcome,
            timer: self.inner.shutdown.child_token(),
        });

        let (topic_id, question, voters) = {
            let round = handle.round();
            let snapshot = round.snapshot();
            (
                snapshot.topic_id,
                snapshot.question,
                snapshot.eligible_voters.len(),
            )
        };

        self.inner
            .rounds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(round_id.clone(), Arc::clone(&handle));

        info!(
            "Voting round {} opened on '{}' ({} eligible voters, timeout {:?})",
            round_id, question, voters, timeout
        );
        self.emit(ConsensusEvent::VotingStarted {
            round_id: round_id.clone(),
            topic_id,
            question,
        });

        self.arm_timer(&round_id, &handle, timeout);
        Ok(round_id)
    }

    /// Record a ballot. A later ballot from the same agent replaces the
    /// earlier one.
    ///
    /// When this was the last missing vote the round is closed before
    /// returning. The vote stands even if that close fails; the failure is
    /// logged and the deadline timer or a later closer finishes the round.
    pub async fn cast_vote(
        &self,
        round_id: &RoundId,
        ballot: Ballot,
    ) -> Result<CastReceipt, VotingError> {
        let handle = self.handle(round_id)?;
        let agent_id = ballot.agent_id.clone();

        let receipt = {
            let mut round = handle.round();
            round.cast(ballot)?
        };

        debug!(
            "Vote from {} accepted in {}{}",
            agent_id,
            round_id,
            if receipt.replaced { " (replaced)" } else { "" }
        );
        self.emit(ConsensusEvent::VoteCast {
            round_id: round_id.clone(),
            agent_id,
        });

        if receipt.all_voted {
            debug!("All eligible voters have voted in {}, closing early", round_id);
            if let Err(e) = self.finish(round_id, handle).await {
                warn!("Closing {} after its last vote failed: {}", round_id, e);
            }
        }

        Ok(receipt)
    }

    /// Close a round and return its outcome.
    ///
    /// Idempotent: once a round has closed, every call returns the same
    /// cached outcome. Dropping the returned future does not abandon the
    /// close; the round still reaches its terminal state.
    pub async fn close_voting(&self, round_id: &RoundId) -> Result<RoundOutcome, VotingError> {
        let handle = self.handle(round_id)?;
        self.finish(round_id, handle).await
    }

    /// Run the close on its own task and wait for it.
    async fn finish(
        &self,
        round_id: &RoundId,
        handle: Arc<RoundHandle>,
    ) -> Result<RoundOutcome, VotingError> {
        if let Some(outcome) = handle.cached_outcome() {
            return Ok(outcome);
        }

        let engine = self.clone();
        let task_round = round_id.clone();
        let task_handle = Arc::clone(&handle);
        let closing =
            tokio::spawn(async move { engine.finish_round(&task_round, &task_handle).await });

        match closing.await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Close of {} was interrupted ({}), completing with the first-listed rule",
                    round_id, e
                );
                self.finish_round(round_id, &handle).await
            }
        }
    }

    async fn finish_round(
        &self,
        round_id: &RoundId,
        handle: &RoundHandle,
    ) -> Result<RoundOutcome, VotingError> {
        let _gate = handle.close_gate.lock().await;
        if let Some(outcome) = handle.cached_outcome() {
            return Ok(outcome);
        }

        // A sealed round without an outcome means an earlier close died
        // while resolving a tie; it is not asked again.
        let resumed = handle.sealed().clone();
        let choice = match resumed {
            Some(_) => None,
            None => {
                let sealed = handle.round().seal()?;
                *handle.sealed() = Some(sealed.clone());
                match sealed.tied_options() {
                    Some(tied) => self.resolve_tie(round_id, handle, tied).await,
                    None => None,
                }
            }
        };

        let Some(sealed) = handle.sealed().take() else {
            return Err(VotingError::RoundClosed(round_id.clone()));
        };
        let outcome = handle.round().complete(sealed, choice.as_deref())?;

        handle.timer.cancel();
        handle.outcome.send_replace(Some(outcome.clone()));

        match &outcome {
            RoundOutcome::Closed(result) => {
                info!(
                    "Voting round {} closed: '{}' wins with {:.1}% ({} of {} voted)",
                    round_id,
                    result.winner.id,
                    result.winner_percentage(),
                    result.participation.actual_voters,
                    result.participation.eligible_voters
                );
                self.emit(ConsensusEvent::VotingClosed {
                    round_id: round_id.clone(),
                    result: result.clone(),
                });
            }
            RoundOutcome::Deferred(participation) => {
                info!(
                    "Voting round {} deferred: quorum not met ({} of {} voted, {:.0}% required)",
                    round_id,
                    participation.actual_voters,
                    participation.eligible_voters,
                    self.inner.settings.quorum.fraction() * 100.0
                );
                self.emit(ConsensusEvent::DecisionDeferred {
                    round_id: round_id.clone(),
                    participation: *participation,
                });
            }
        }

        Ok(outcome)
    }

    /// Wait until the round reaches a terminal state.
    pub async fn wait_for_close(&self, round_id: &RoundId) -> Result<RoundOutcome, VotingError> {
        let handle = self.handle(round_id)?;
        let mut rx = handle.outcome.subscribe();
        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| VotingError::RoundNotFound(round_id.clone()))?
            .clone();
        outcome.ok_or_else(|| VotingError::RoundNotFound(round_id.clone()))
    }

    /// Read-only view of a round in any state.
    pub fn get_voting_status(&self, round_id: &RoundId) -> Option<RoundSnapshot> {
        let handle = self.handle(round_id).ok()?;
        let snapshot = handle.round().snapshot();
        Some(snapshot)
    }

    /// Terminal outcome of a round, if it has closed.
    pub fn outcome(&self, round_id: &RoundId) -> Option<RoundOutcome> {
        self.handle(round_id).ok()?.cached_outcome()
    }

    /// Ids of rounds still accepting votes, sorted.
    pub fn active_rounds(&self) -> Vec<RoundId> {
        let handles: Vec<(RoundId, Arc<RoundHandle>)> = self
            .inner
            .rounds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect();

        let mut open: Vec<RoundId> = handles
            .into_iter()
            .filter(|(_, handle)| handle.round().state().is_open())
            .map(|(id, _)| id)
            .collect();
        open.sort();
        open
    }

    /// Cancel every pending deadline timer. Open rounds stay open until
    /// closed explicitly.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Forget a round that has reached its terminal state.
    ///
    /// Returns `false` (and keeps the round) when it is unknown or not yet
    /// closed.
    pub fn release_round(&self, round_id: &RoundId) -> bool {
        let mut rounds = self
            .inner
            .rounds
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let terminal = rounds
            .get(round_id)
            .is_some_and(|handle| handle.cached_outcome().is_some());
        if terminal {
            rounds.remove(round_id);
        }
        terminal
    }

    /// Forget every round that has reached its terminal state. Returns how
    /// many were removed.
    pub fn prune_closed(&self) -> usize {
        let mut rounds = self
            .inner
            .rounds
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = rounds.len();
        rounds.retain(|_, handle| handle.cached_outcome().is_none());
        let pruned = before - rounds.len();
        if pruned > 0 {
            debug!("Pruned {} closed rounds, {} remain", pruned, rounds.len());
        }
        pruned
    }

    // ==================== Weights ====================

    /// Set an agent's standing weight, clamped to `[0, 1]`.
    ///
    /// Only rounds opened after this call see the new weight. Returns the
    /// weight actually stored; non-finite values are ignored.
    pub fn set_agent_weight(&self, agent: &AgentId, weight: f64) -> f64 {
        if !weight.is_finite() {
            warn!("Ignoring non-finite weight for {}", agent);
            return self.agent_weight(agent);
        }
        let weight = weight.clamp(0.0, 1.0);
        self.inner
            .weights
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent.clone(), weight);
        debug!("Weight of {} set to {:.3}", agent, weight);
        weight
    }

    /// Current standing weight of an agent (1.0 when never set).
    pub fn agent_weight(&self, agent: &AgentId) -> f64 {
        self.inner
            .weights
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent)
            .copied()
            .unwrap_or(DEFAULT_AGENT_WEIGHT)
    }

    // ==================== Internals ====================

    fn handle(&self, round_id: &RoundId) -> Result<Arc<RoundHandle>, VotingError> {
        self.inner
            .rounds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(round_id)
            .cloned()
            .ok_or_else(|| VotingError::RoundNotFound(round_id.clone()))
    }

    fn emit(&self, event: ConsensusEvent) {
        self.inner.observer.on_event(&event);
    }

    /// Ask the resolver to pick among `tied`, waiting at most the grace
    /// period. `None` means the deterministic first-listed rule applies.
    async fn resolve_tie(
        &self,
        round_id: &RoundId,
        handle: &RoundHandle,
        tied: &[String],
    ) -> Option<String> {
        let (snapshot, tied_options) = {
            let round = handle.round();
            let options: Vec<VoteOption> = tied
                .iter()
                .filter_map(|id| round.topic().option(id).cloned())
                .collect();
            (round.snapshot(), options)
        };

        info!(
            "Tie in {} between {}",
            round_id,
            tied.join(", ")
        );
        self.emit(ConsensusEvent::TieBreakNeeded {
            round_id: round_id.clone(),
            tied_options: tied_options.clone(),
        });

        let Some(resolver) = &self.inner.tie_breaker else {
            warn!(
                "No tie-break authority for {}, falling back to first-listed option",
                round_id
            );
            return None;
        };

        let grace = self.inner.settings.tie_break_grace;
        match tokio::time::timeout(grace, resolver.resolve_tie(&snapshot, &tied_options)).await {
            Ok(Some(choice)) if tied.contains(&choice) => Some(choice),
            Ok(Some(choice)) => {
                warn!(
                    "Tie-break choice '{}' for {} is not a tied option, falling back to first-listed",
                    choice, round_id
                );
                None
            }
            Ok(None) => {
                info!(
                    "Tie-break authority abstained for {}, falling back to first-listed option",
                    round_id
                );
                None
            }
            Err(_) => {
                warn!(
                    "Tie-break authority did not answer within {:?} for {}, falling back to first-listed option",
                    grace, round_id
                );
                None
            }
        }
    }

    fn arm_timer(&self, round_id: &RoundId, handle: &RoundHandle, timeout: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                "No async runtime; round {} will only close explicitly or when everyone has voted",
                round_id
            );
            return;
        };

        let engine: Weak<EngineInner> = Arc::downgrade(&self.inner);
        let cancelled = handle.timer.clone();
        let round_id = round_id.clone();

        runtime.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    let Some(inner) = engine.upgrade() else { return };
                    debug!("Deadline reached for {}", round_id);
                    if let Err(e) = (VotingEngine { inner }).close_voting(&round_id).await {
                        warn!("Deadline close of {} failed: {}", round_id, e);
                    }
                }
            }
        });
    }
}

impl Default for VotingEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
