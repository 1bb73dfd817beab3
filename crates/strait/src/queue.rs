//! Bounded FIFO queue of chunks awaiting transfer.
//!
//! The queue carries no locking of its own — it is owned exclusively by the
//! bridge core, which serializes all access. A full queue hands the chunk
//! back to the caller; nothing is ever silently dropped.

use std::collections::VecDeque;

use strait_core::Chunk;

/// Bounded buffer of chunks between producer and consumer.
#[derive(Debug)]
pub struct ChunkQueue {
    buf: VecDeque<Chunk>,
    capacity: usize,
}

impl ChunkQueue {
    /// Create a queue holding at most `capacity` chunks.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity validated by BridgeConfig");
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a chunk. Returns the chunk back when the queue is full —
    /// occupancy is unchanged by a rejected push.
    pub fn push(&mut self, chunk: Chunk) -> Result<(), Chunk> {
        if self.buf.len() >= self.capacity {
            return Err(chunk);
        }
        self.buf.push_back(chunk);
        Ok(())
    }

    /// Remove and return the oldest chunk.
    pub fn pop(&mut self) -> Option<Chunk> {
        self.buf.pop_front()
    }

    /// Current occupancy.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard everything. Returns how many chunks were dropped —
    /// the error and close paths report this count.
    pub fn clear(&mut self) -> usize {
        let dropped = self.buf.len();
        self.buf.clear();
        dropped
    }
}
