//! Events observable on the sink side of a bridge.
//!
//! Listener fan-out is an explicit ordered list of callbacks per
//! `EventKind`; `BridgeEvent` is the tagged union delivered to them.

use crate::chunk::Chunk;
use crate::error::SourceError;

/// The kinds of events a consumer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A chunk was drained from the queue.
    Data,
    /// End-of-stream: every buffered chunk has been delivered.
    End,
    /// The source failed. Fired exactly once.
    Error,
    /// Occupancy fell back to the low-water mark; the producer was resumed.
    Drain,
    /// The bridge was closed; buffered chunks were discarded.
    Close,
    /// Meta-event: a listener is about to be registered.
    NewListener,
    /// Meta-event: a listener was removed.
    RemoveListener,
}

/// A delivered event.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// A drained chunk, moved out of the queue.
    Data(Chunk),
    End,
    Error(SourceError),
    Drain,
    Close,
    /// Fires synchronously before the listener for the named kind is added.
    NewListener(EventKind),
    /// Fires after the listener for the named kind was removed.
    RemoveListener(EventKind),
}

impl BridgeEvent {
    /// The kind this event is delivered under.
    pub fn kind(&self) -> EventKind {
        match self {
            BridgeEvent::Data(_) => EventKind::Data,
            BridgeEvent::End => EventKind::End,
            BridgeEvent::Error(_) => EventKind::Error,
            BridgeEvent::Drain => EventKind::Drain,
            BridgeEvent::Close => EventKind::Close,
            BridgeEvent::NewListener(_) => EventKind::NewListener,
            BridgeEvent::RemoveListener(_) => EventKind::RemoveListener,
        }
    }
}
