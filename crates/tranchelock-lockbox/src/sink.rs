//! Event sinks: the append-only observation stream.
//!
//! Lockboxes and the registry write [`LockboxEvent`]s to an injected sink
//! and never read them back. Indexers, tests and hosts pick the sink.

use std::sync::mpsc::Sender;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tranchelock_types::{CreationRecord, LockboxEvent, SettlementRecord};

/// Receiver of emitted records. Must not fail back into the caller.
///
/// `emit` may run while the emitter holds its own lock (the registry emits
/// creation records under its index write lock). An implementation must
/// not call back into the registry or the emitting lockbox from `emit`;
/// hand the record to another thread instead, as [`ChannelSink`] does.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LockboxEvent);
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: LockboxEvent) {}
}

/// A record with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Zero-based, gap-free, assigned in emission order.
    pub sequence: u64,
    pub event: LockboxEvent,
}

/// In-memory append-only log.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<RecordedEvent>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far.
    #[must_use]
    pub fn records(&self) -> Vec<RecordedEvent> {
        self.entries.lock().clone()
    }

    /// Records with `sequence >= from`, for incremental indexers.
    #[must_use]
    pub fn since(&self, from: u64) -> Vec<RecordedEvent> {
        self.entries
            .lock()
            .iter()
            .filter(|r| r.sequence >= from)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn settlements(&self) -> Vec<SettlementRecord> {
        self.entries
            .lock()
            .iter()
            .filter_map(|r| r.event.as_settlement().cloned())
            .collect()
    }

    #[must_use]
    pub fn creations(&self) -> Vec<CreationRecord> {
        self.entries
            .lock()
            .iter()
            .filter_map(|r| r.event.as_creation().cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: LockboxEvent) {
        let mut entries = self.entries.lock();
        let sequence = entries.len() as u64;
        entries.push(RecordedEvent { sequence, event });
    }
}

/// Forwards records over a standard channel.
///
/// A dropped receiver is not an error for the emitter; records are lost.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<LockboxEvent>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: Sender<LockboxEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: LockboxEvent) {
        if let Err(err) = self.tx.send(event) {
            debug!(
                kind = %err.0.kind(),
                lockbox = %err.0.lockbox(),
                "Event receiver dropped; record discarded"
            );
        }
    }
}
