//! Port for the structured consensus event surface.
//!
//! Defines the [`ConsensusObserver`] trait through which the Voting Engine and
//! the Coordinating Authority publish lifecycle events for external observers
//! (event logs, dashboards, buses).
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port carries machine-readable
//! events with full payloads.

use hive_domain::{
    AgentId, DecisionRecord, MajorityResult, Participation, RoundId, VoteOption,
};
use serde::Serialize;

/// A consensus lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConsensusEvent {
    VotingStarted {
        round_id: RoundId,
        topic_id: String,
        question: String,
    },
    VoteCast {
        round_id: RoundId,
        agent_id: AgentId,
    },
    VotingClosed {
        round_id: RoundId,
        result: MajorityResult,
    },
    DecisionDeferred {
        round_id: RoundId,
        participation: Participation,
    },
    TieBreakNeeded {
        round_id: RoundId,
        tied_options: Vec<VoteOption>,
    },
    DecisionMade {
        record: DecisionRecord,
    },
    EmergencyHandled {
        record: DecisionRecord,
    },
}

impl ConsensusEvent {
    /// Event type identifier, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            ConsensusEvent::VotingStarted { .. } => "voting-started",
            ConsensusEvent::VoteCast { .. } => "vote-cast",
            ConsensusEvent::VotingClosed { .. } => "voting-closed",
            ConsensusEvent::DecisionDeferred { .. } => "decision-deferred",
            ConsensusEvent::TieBreakNeeded { .. } => "tie-break-needed",
            ConsensusEvent::DecisionMade { .. } => "decision-made",
            ConsensusEvent::EmergencyHandled { .. } => "emergency-handled",
        }
    }

    /// Round the event belongs to, if it is a round-level event.
    pub fn round_id(&self) -> Option<&RoundId> {
        match self {
            ConsensusEvent::VotingStarted { round_id, .. }
            | ConsensusEvent::VoteCast { round_id, .. }
            | ConsensusEvent::VotingClosed { round_id, .. }
            | ConsensusEvent::DecisionDeferred { round_id, .. }
            | ConsensusEvent::TieBreakNeeded { round_id, .. } => Some(round_id),
            ConsensusEvent::DecisionMade { .. } | ConsensusEvent::EmergencyHandled { .. } => None,
        }
    }
}

/// Port for observing consensus events.
///
/// `on_event` is synchronous and non-fallible so that a slow or broken
/// observer never disturbs a voting round. Failures are the observer's to
/// swallow.
pub trait ConsensusObserver: Send + Sync {
    fn on_event(&self, event: &ConsensusEvent);
}

/// No-op implementation for tests and when no observer is attached.
pub struct NoObserver;

impl ConsensusObserver for NoObserver {
    fn on_event(&self, _event: &ConsensusEvent) {}
}

/// An observer that delegates to multiple inner observers.
///
/// ```text
/// VotingEngine / CoordinatingAuthority
///                 |
///        CompositeObserver
///        +--------+---------+
///        |                  |
///   JsonlEventLog    BroadcastEventBus
/// ```
#[derive(Default)]
pub struct CompositeObserver {
    delegates: Vec<std::sync::Arc<dyn ConsensusObserver>>,
}

impl CompositeObserver {
    pub fn new(delegates: Vec<std::sync::Arc<dyn ConsensusObserver>>) -> Self {
        Self { delegates }
    }

    pub fn push(&mut self, observer: std::sync::Arc<dyn ConsensusObserver>) {
        self.delegates.push(observer);
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl ConsensusObserver for CompositeObserver {
    fn on_event(&self, event: &ConsensusEvent) {
        for d in &self.delegates {
            d.on_event(event);
        }
    }
}
