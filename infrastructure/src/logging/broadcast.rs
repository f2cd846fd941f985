//! In-process fan-out of consensus events.

use hive_application::{ConsensusEvent, ConsensusObserver};
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of events buffered per subscriber before it lags.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Publishes every consensus event to any number of subscribers.
///
/// Publishing never blocks. A subscriber that falls more than the channel
/// capacity behind sees `RecvError::Lagged` and skips ahead.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<ConsensusEvent>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsensusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl ConsensusObserver for BroadcastEventBus {
    fn on_event(&self, event: &ConsensusEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("No subscribers for {} event", event.event_type());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_domain::{AgentId, RoundId};
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn vote_cast(agent: &str) -> ConsensusEvent {
        ConsensusEvent::VoteCast {
            round_id: RoundId::new("round-1"),
            agent_id: AgentId::new(agent),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_every_event() {
        let bus = BroadcastEventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.on_event(&vote_cast("a1"));
        bus.on_event(&vote_cast("a2"));

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap(), vote_cast("a1"));
            assert_eq!(rx.recv().await.unwrap(), vote_cast("a2"));
            assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let bus = BroadcastEventBus::new(4);
        bus.on_event(&vote_cast("a1"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let bus = BroadcastEventBus::new(2);
        let mut rx = bus.subscribe();
        for agent in ["a1", "a2", "a3"] {
            bus.on_event(&vote_cast(agent));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap(), vote_cast("a2"));
    }
}
