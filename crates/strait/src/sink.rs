//! Sink adapter — the drain pump.
//!
//! Pops chunks off the bridge queue (only ever through the bridge's pop
//! surface) and fans them out to `Data` listeners in order. Also performs
//! the Draining → Ended transition, emits `End` once everything buffered
//! has been delivered, and emits `Drain` when backpressure releases.
//!
//! Runs as one cooperative task; it yields to the scheduler after every
//! delivery so a producer on the same event loop gets its turn.

use strait_core::BridgeEvent;

use crate::bridge::{Bridge, Delivery};

/// Drives delivery for one bridge until the stream reaches a terminal
/// state. Spawn it next to the source task:
///
/// ```rust,ignore
/// let bridge = Bridge::new(config.bridge)?;
/// tokio::spawn(SinkAdapter::new(bridge.clone()).run());
/// ```
pub struct SinkAdapter {
    bridge: Bridge,
}

impl SinkAdapter {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Pump until Ended or Errored. Returns once the stream is over.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.bridge.pop_for_delivery() {
                Delivery::Chunk { chunk, resume } => {
                    tracing::trace!(seq = chunk.seq, len = chunk.len(), "delivering chunk");
                    self.bridge.emit(&BridgeEvent::Data(chunk));
                    if resume {
                        tracing::debug!(
                            low_water = self.bridge.config().low_water,
                            "backpressure released"
                        );
                        self.bridge.emit(&BridgeEvent::Drain);
                    }
                    self.bridge.wake_writer();
                    tokio::task::yield_now().await;
                }
                Delivery::Finished => {
                    tracing::info!("stream drained, ended");
                    self.bridge.emit(&BridgeEvent::End);
                    self.bridge.wake_writer();
                    return Ok(());
                }
                Delivery::Wait => self.bridge.wait_for_work().await,
                Delivery::Stop => {
                    tracing::debug!(state = ?self.bridge.state(), "sink adapter stopping");
                    return Ok(());
                }
            }
        }
    }
}
