//! strait-core — shared types for the strait streaming bridge.
//! All other strait crates depend on this one.

pub mod chunk;
pub mod config;
pub mod error;
pub mod event;
pub mod state;

pub use chunk::Chunk;
pub use config::{BridgeConfig, SourceConfig, StraitConfig};
pub use error::{BridgeError, SourceError};
pub use event::{BridgeEvent, EventKind};
pub use state::StreamState;
