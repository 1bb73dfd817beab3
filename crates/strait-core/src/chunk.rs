//! Chunk — the atomic unit moved through the bridge.

use bytes::Bytes;

/// One discrete unit of byte data in flight.
///
/// Produced by the source, owned by the queue until drained, then moved to
/// the consumer. The payload is opaque — the bridge never inspects it.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position in the stream. Assigned by the bridge core, strictly
    /// increasing from 0. A rejected push never consumes a number.
    pub seq: u64,

    /// Opaque payload bytes.
    pub payload: Bytes,
}

impl Chunk {
    pub fn new(seq: u64, payload: Bytes) -> Self {
        Self { seq, payload }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
