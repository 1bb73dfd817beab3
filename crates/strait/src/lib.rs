//! strait — a byte-stream bridge between runtimes.
//!
//! A producing source pushes opaque byte chunks in on one side; a consuming
//! sink drains them out the other, with a bounded queue, two-threshold
//! backpressure, and an explicit lifecycle in between:
//!
//!   source shim → bridge core → chunk queue → sink adapter → listeners
//!
//! Construct a [`Bridge`] per stream, spawn a [`SinkAdapter`] to drain it,
//! subscribe listeners for `Data`/`End`/`Error`, and drive the source side
//! either through the shim notifications (`on_open`/`on_data`/`on_end`/
//! `on_error`), a [`BridgeWriter`] (`futures::Sink<Bytes>`), or a
//! [`FileSource`].

pub mod bridge;
pub mod emitter;
pub mod file_source;
pub mod flow;
pub mod queue;
pub mod sink;
pub mod writer;

pub use bridge::Bridge;
pub use emitter::{Emitter, SubscriptionHandle, DEFAULT_MAX_LISTENERS};
pub use file_source::FileSource;
pub use flow::FlowSignal;
pub use queue::ChunkQueue;
pub use sink::SinkAdapter;
pub use writer::BridgeWriter;

pub use strait_core::{
    BridgeConfig, BridgeError, BridgeEvent, Chunk, EventKind, SourceConfig, SourceError,
    StraitConfig, StreamState,
};
