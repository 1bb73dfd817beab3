//! Error types for bridge operations.
//!
//! Three kinds, none fatal to the process:
//!   QueueFull   — local backpressure, retry after the signal clears
//!   Closed      — push after end-of-stream or a terminal state
//!   Source      — the upstream producer failed; terminal for the bridge

use std::fmt;
use std::sync::Arc;

use crate::state::StreamState;

/// Errors returned from bridge-core operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// The chunk queue is at capacity. The producer was signaled to pause
    /// before this point; retry once the backpressure signal clears.
    #[error("chunk queue full ({occupancy} buffered)")]
    QueueFull { occupancy: usize },

    /// Push after end-of-stream or a terminal state. Logged, non-fatal.
    #[error("bridge no longer accepts data (state {state:?})")]
    Closed { state: StreamState },

    /// The source reported a failure. Terminal.
    #[error("source failed: {0}")]
    Source(#[from] SourceError),
}

/// A terminal failure reported by the source.
///
/// Clonable so one cause can be fanned out to every registered error
/// listener — each sees the same underlying error.
#[derive(Debug, Clone)]
pub struct SourceError {
    cause: Arc<dyn std::error::Error + Send + Sync>,
}

impl SourceError {
    /// Wrap an arbitrary error as the terminal cause.
    pub fn new<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            cause: Arc::new(cause),
        }
    }

    /// Build a cause from a bare message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            cause: Arc::new(Message(message.into())),
        }
    }

    /// The underlying cause.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Message-only cause for `SourceError::msg`.
#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}
