//! Consensus event sinks.
//!
//! Adapters for the [`ConsensusObserver`](hive_application::ConsensusObserver)
//! port: [`JsonlEventLog`] appends events to a file, [`BroadcastEventBus`]
//! fans them out to in-process subscribers.

mod broadcast;
mod jsonl_event_log;

pub use broadcast::{BroadcastEventBus, DEFAULT_EVENT_CAPACITY};
pub use jsonl_event_log::JsonlEventLog;
