//! File-backed source shim.
//!
//! Reads a file in bounded chunks and feeds the bridge: open, then data
//! until EOF, then end — or error, reported to the bridge exactly once.
//! Honors the backpressure signal between reads, so a slow consumer keeps
//! the file read ahead bounded by the queue capacity.

use std::path::PathBuf;

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use strait_core::config::SourceConfig;
use strait_core::{BridgeError, SourceError};

use crate::bridge::Bridge;
use crate::flow::FlowSignal;

/// Streams a file into a bridge.
pub struct FileSource {
    path: PathBuf,
    read_chunk_bytes: usize,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_chunk_bytes: SourceConfig::default().read_chunk_bytes,
        }
    }

    pub fn with_config(mut self, config: &SourceConfig) -> Self {
        self.read_chunk_bytes = config.read_chunk_bytes.max(1);
        self
    }

    /// Read the file to EOF, pushing chunks through the bridge.
    ///
    /// Failures are reported to the bridge (terminating the stream for its
    /// consumers) and returned to the caller. A bridge closed from the
    /// consumer side stops the read early without an error.
    pub async fn run(self, bridge: Bridge) -> anyhow::Result<()> {
        let mut flow = bridge.flow();

        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) => {
                let cause = SourceError::new(e);
                bridge.on_error(cause.clone());
                return Err(anyhow::Error::new(cause)
                    .context(format!("failed to open {}", self.path.display())));
            }
        };

        bridge.on_open();
        tracing::debug!(path = %self.path.display(), chunk_bytes = self.read_chunk_bytes, "file source started");

        let mut total = 0u64;
        loop {
            flow.resumed().await;

            let mut buf = BytesMut::with_capacity(self.read_chunk_bytes);
            match file.read_buf(&mut buf).await {
                Ok(0) => {
                    tracing::debug!(total, "file read to EOF");
                    bridge.on_end();
                    return Ok(());
                }
                Ok(n) => {
                    total += n as u64;
                    if !self.push_until_accepted(&bridge, &mut flow, buf.freeze()).await {
                        tracing::debug!(total, "bridge closed under the source, stopping read");
                        return Ok(());
                    }
                }
                Err(e) => {
                    let cause = SourceError::new(e);
                    bridge.on_error(cause.clone());
                    return Err(anyhow::Error::new(cause)
                        .context(format!("read failed on {}", self.path.display())));
                }
            }
        }
    }

    /// Push one chunk, retrying on queue-full after the backpressure signal
    /// clears. Returns false when the bridge no longer accepts data.
    async fn push_until_accepted(
        &self,
        bridge: &Bridge,
        flow: &mut FlowSignal,
        payload: bytes::Bytes,
    ) -> bool {
        loop {
            match bridge.on_data(payload.clone()) {
                Ok(()) => return true,
                Err(BridgeError::QueueFull { .. }) => {
                    flow.resumed().await;
                    // The pump runs on the same loop — let it drain.
                    tokio::task::yield_now().await;
                }
                Err(_) => return false,
            }
        }
    }
}
