//! `futures::Sink` view of the bridge's source side.
//!
//! Lets any `futures::Stream` of byte chunks be forwarded into a bridge
//! with `SinkExt::send_all` — the pipe operation. `poll_ready` observes
//! backpressure, `poll_flush` resolves when the queue is empty, and
//! `poll_close` signals end-of-stream and resolves once the bridge ends.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Sink;

use strait_core::BridgeError;

use crate::bridge::Bridge;

/// Writes bytes into a bridge as a `futures::Sink<Bytes>`.
///
/// Obtained from [`Bridge::writer`]. Dropping the writer without closing
/// it leaves the stream open — call `SinkExt::close` after the last send
/// to signal end-of-stream.
#[derive(Debug)]
pub struct BridgeWriter {
    bridge: Bridge,
    end_sent: bool,
}

impl BridgeWriter {
    pub(crate) fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            end_sent: false,
        }
    }
}

impl Sink<Bytes> for BridgeWriter {
    type Error = BridgeError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.bridge.poll_ready_for_write(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
        self.bridge.on_data(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.bridge.poll_flushed(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let this = self.get_mut();
        if !this.end_sent {
            this.end_sent = true;
            this.bridge.on_end();
        }
        this.bridge.poll_ended(cx)
    }
}
