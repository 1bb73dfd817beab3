//! Stream lifecycle state.
//!
//! Exactly one live `StreamState` exists per bridge, mutated only inside
//! the bridge core's critical section. Transitions:
//!
//!   Idle → Open       first accepted chunk, or explicit open
//!   Open → Draining   end-of-stream with chunks still buffered
//!   Draining → Ended  queue empties after end-of-stream
//!   Idle|Open → Ended end-of-stream with an empty queue, or close()
//!   any non-terminal → Errored   source failure
//!
//! Ended and Errored are terminal — no further data transitions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Constructed, nothing seen yet.
    Idle,
    /// Data is flowing (or may flow).
    Open,
    /// Source signaled end-of-stream; buffered chunks still draining.
    Draining,
    /// All done. Nothing more will be delivered.
    Ended,
    /// Source failed. Pending chunks were discarded.
    Errored,
}

impl StreamState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Ended | StreamState::Errored)
    }

    /// Whether a pushed chunk can still be accepted.
    ///
    /// Draining is not terminal, but data after end-of-stream violates the
    /// source contract and is rejected all the same.
    pub fn accepts_data(self) -> bool {
        matches!(self, StreamState::Idle | StreamState::Open)
    }
}
