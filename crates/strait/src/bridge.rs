//! Bridge core — owns the chunk queue, drives the lifecycle state machine,
//! and enforces the flow-control contract between source and sink.
//!
//! The source side calls `on_open` / `on_data` / `on_end` / `on_error`.
//! The sink side drains through [`crate::sink::SinkAdapter`], which reaches
//! the queue only via `pop_for_delivery` — never the buffer itself.
//!
//! Backpressure: a successful push that brings occupancy to `high_water`
//! flips the pause signal; the drain pump flips it back once occupancy is
//! down to `low_water`. The gap between the two thresholds is what keeps
//! the signal from thrashing at a single boundary value.

use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::task::AtomicWaker;
use tokio::sync::{watch, Notify};

use strait_core::config::ConfigError;
use strait_core::{BridgeConfig, BridgeError, BridgeEvent, Chunk, EventKind, SourceError, StreamState};

use crate::emitter::{Emitter, SubscriptionHandle};
use crate::flow::FlowSignal;
use crate::writer::BridgeWriter;

/// One streaming bridge instance.
///
/// Cheap to clone — clones share the same queue, state, and listeners.
/// There is no process-wide singleton: construct one per stream, with its
/// own injected configuration.
#[derive(Clone)]
pub struct Bridge {
    shared: Arc<Shared>,
}

struct Shared {
    config: BridgeConfig,
    emitter: Emitter,
    inner: Mutex<Inner>,
    /// Wakes the drain pump when chunks or lifecycle transitions arrive.
    wake: Notify,
    /// Backpressure signal: true = producer should pause.
    flow_tx: watch::Sender<bool>,
    /// Wakes a `BridgeWriter` blocked in poll_ready/poll_flush/poll_close.
    writer_waker: AtomicWaker,
}

struct Inner {
    state: StreamState,
    queue: crate::queue::ChunkQueue,
    next_seq: u64,
    paused: bool,
    /// Set by on_error; reported to writers observing the Errored state.
    cause: Option<SourceError>,
}

/// What the drain pump should do next. See `Bridge::pop_for_delivery`.
pub(crate) enum Delivery {
    /// Deliver this chunk. `resume` means occupancy just reached the
    /// low-water mark and the producer was unpaused.
    Chunk { chunk: Chunk, resume: bool },
    /// The queue emptied after end-of-stream; Ended was just entered.
    Finished,
    /// Nothing buffered and the stream is still live — wait for work.
    Wait,
    /// Terminal state reached elsewhere (error or close) — stop pumping.
    Stop,
}

impl Bridge {
    /// Build a bridge from a validated configuration.
    pub fn new(config: BridgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (flow_tx, _) = watch::channel(false);
        let queue = crate::queue::ChunkQueue::new(config.capacity);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                emitter: Emitter::new(),
                inner: Mutex::new(Inner {
                    state: StreamState::Idle,
                    queue,
                    next_seq: 0,
                    paused: false,
                    cause: None,
                }),
                wake: Notify::new(),
                flow_tx,
                writer_waker: AtomicWaker::new(),
            }),
        })
    }

    // ── Source-facing surface ─────────────────────────────────────────────────

    /// The source is live. At most once; repeats are tolerated with a warn.
    pub fn on_open(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        match inner.state {
            StreamState::Idle => {
                inner.state = StreamState::Open;
                drop(inner);
                tracing::debug!("source opened");
            }
            state => {
                drop(inner);
                tracing::warn!(?state, "duplicate or late open, ignoring");
            }
        }
    }

    /// Accept one chunk of bytes from the source.
    ///
    /// The first accepted chunk opens an idle bridge. A rejected push
    /// consumes no sequence number and leaves the queue untouched.
    pub fn on_data(&self, payload: Bytes) -> Result<(), BridgeError> {
        let (seq, occupancy, pause) = {
            let mut inner = self.shared.inner.lock().unwrap();
            if !inner.state.accepts_data() {
                let state = inner.state;
                drop(inner);
                tracing::warn!(?state, "chunk after end-of-stream, rejecting");
                return Err(BridgeError::Closed { state });
            }
            if inner.queue.is_full() {
                let occupancy = inner.queue.len();
                drop(inner);
                return Err(BridgeError::QueueFull { occupancy });
            }
            if inner.state == StreamState::Idle {
                inner.state = StreamState::Open;
                tracing::debug!("opened on first chunk");
            }
            let seq = inner.next_seq;
            inner.next_seq += 1;
            // Cannot fail: fullness was checked under the same lock.
            let _ = inner.queue.push(Chunk::new(seq, payload));
            let occupancy = inner.queue.len();
            let pause = !inner.paused && occupancy >= self.shared.config.high_water;
            if pause {
                inner.paused = true;
                self.shared.flow_tx.send_replace(true);
            }
            (seq, occupancy, pause)
        };

        if pause {
            tracing::debug!(occupancy, high_water = self.shared.config.high_water, "backpressure engaged");
        }
        tracing::trace!(seq, occupancy, "chunk queued");
        self.shared.wake.notify_one();
        Ok(())
    }

    /// End-of-stream from the source. With an empty queue the bridge ends
    /// immediately; otherwise it drains first.
    pub fn on_end(&self) {
        let ended = {
            let mut inner = self.shared.inner.lock().unwrap();
            match inner.state {
                StreamState::Idle | StreamState::Open => {
                    if inner.queue.is_empty() {
                        inner.state = StreamState::Ended;
                        true
                    } else {
                        inner.state = StreamState::Draining;
                        tracing::debug!(remaining = inner.queue.len(), "end-of-stream, draining");
                        false
                    }
                }
                state => {
                    drop(inner);
                    tracing::warn!(?state, "duplicate end-of-stream, ignoring");
                    return;
                }
            }
        };

        if ended {
            tracing::info!("stream ended");
            self.shared.emitter.emit(&BridgeEvent::End);
        }
        self.shared.wake.notify_one();
        self.shared.writer_waker.wake();
    }

    /// Terminal failure from the source. Buffered chunks are discarded and
    /// every registered error listener hears the cause exactly once.
    pub fn on_error(&self, cause: SourceError) {
        let discarded = {
            let mut inner = self.shared.inner.lock().unwrap();
            if inner.state.is_terminal() {
                let state = inner.state;
                drop(inner);
                tracing::warn!(?state, error = %cause, "source error after terminal state, ignoring");
                return;
            }
            inner.state = StreamState::Errored;
            inner.cause = Some(cause.clone());
            if inner.paused {
                inner.paused = false;
                self.shared.flow_tx.send_replace(false);
            }
            inner.queue.clear()
        };

        tracing::warn!(error = %cause, discarded, "source failed, bridge errored");
        self.shared.emitter.emit(&BridgeEvent::Error(cause));
        self.shared.wake.notify_one();
        self.shared.writer_waker.wake();
    }

    // ── Consumer-facing surface ───────────────────────────────────────────────

    /// Cancel the stream. Buffered chunks are discarded, never delivered;
    /// a delivery already handed to listeners completes first.
    pub fn close(&self) {
        let discarded = {
            let mut inner = self.shared.inner.lock().unwrap();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = StreamState::Ended;
            if inner.paused {
                inner.paused = false;
                self.shared.flow_tx.send_replace(false);
            }
            inner.queue.clear()
        };

        tracing::info!(discarded, "bridge closed");
        self.shared.emitter.emit(&BridgeEvent::Close);
        self.shared.wake.notify_one();
        self.shared.writer_waker.wake();
    }

    /// Register a listener. See [`Emitter::subscribe`].
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&BridgeEvent) + Send + 'static,
    {
        self.shared.emitter.subscribe(kind, callback)
    }

    /// Register a listener that fires at most once.
    pub fn subscribe_once<F>(&self, kind: EventKind, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&BridgeEvent) + Send + 'static,
    {
        self.shared.emitter.subscribe_once(kind, callback)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.shared.emitter.unsubscribe(handle)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.shared.emitter.listener_count(kind)
    }

    pub fn remove_all_listeners(&self, kind: Option<EventKind>) -> usize {
        self.shared.emitter.remove_all(kind)
    }

    pub fn set_max_listeners(&self, n: usize) {
        self.shared.emitter.set_max_listeners(n)
    }

    // ── Observers ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> StreamState {
        self.shared.inner.lock().unwrap().state
    }

    /// Current queue occupancy.
    pub fn queued(&self) -> usize {
        self.shared.inner.lock().unwrap().queue.len()
    }

    /// Whether the producer is currently asked to pause.
    pub fn is_paused(&self) -> bool {
        self.shared.inner.lock().unwrap().paused
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// The backpressure signal, for the producing side to watch.
    pub fn flow(&self) -> FlowSignal {
        FlowSignal::new(self.shared.flow_tx.subscribe())
    }

    /// A `futures::Sink<Bytes>` view of the source side.
    pub fn writer(&self) -> BridgeWriter {
        BridgeWriter::new(self.clone())
    }

    // ── Drain pump support (crate-internal) ───────────────────────────────────

    /// Pop the next chunk for delivery, or decide what the pump does
    /// instead. The Draining → Ended transition happens here, under the
    /// same lock that guards pushes, so nothing can slip in between.
    pub(crate) fn pop_for_delivery(&self) -> Delivery {
        let mut inner = self.shared.inner.lock().unwrap();
        match inner.state {
            StreamState::Ended | StreamState::Errored => Delivery::Stop,
            _ => match inner.queue.pop() {
                Some(chunk) => {
                    let occupancy = inner.queue.len();
                    let resume = inner.paused && occupancy <= self.shared.config.low_water;
                    if resume {
                        inner.paused = false;
                        self.shared.flow_tx.send_replace(false);
                    }
                    Delivery::Chunk { chunk, resume }
                }
                None => {
                    if inner.state == StreamState::Draining {
                        inner.state = StreamState::Ended;
                        Delivery::Finished
                    } else {
                        Delivery::Wait
                    }
                }
            },
        }
    }

    pub(crate) async fn wait_for_work(&self) {
        self.shared.wake.notified().await;
    }

    pub(crate) fn emit(&self, event: &BridgeEvent) {
        self.shared.emitter.emit(event);
    }

    pub(crate) fn wake_writer(&self) {
        self.shared.writer_waker.wake();
    }

    // ── Writer poll support (crate-internal) ──────────────────────────────────

    pub(crate) fn poll_ready_for_write(&self, cx: &mut Context<'_>) -> Poll<Result<(), BridgeError>> {
        // Register before checking state — a wake between the check and the
        // registration would otherwise be lost.
        self.shared.writer_waker.register(cx.waker());
        let inner = self.shared.inner.lock().unwrap();
        if !inner.state.accepts_data() {
            return Poll::Ready(Err(self.terminal_error(&inner)));
        }
        if inner.paused {
            Poll::Pending
        } else {
            Poll::Ready(Ok(()))
        }
    }

    pub(crate) fn poll_flushed(&self, cx: &mut Context<'_>) -> Poll<Result<(), BridgeError>> {
        self.shared.writer_waker.register(cx.waker());
        let inner = self.shared.inner.lock().unwrap();
        if inner.state == StreamState::Errored {
            return Poll::Ready(Err(self.terminal_error(&inner)));
        }
        if inner.queue.is_empty() {
            Poll::Ready(Ok(()))
        } else {
            Poll::Pending
        }
    }

    pub(crate) fn poll_ended(&self, cx: &mut Context<'_>) -> Poll<Result<(), BridgeError>> {
        self.shared.writer_waker.register(cx.waker());
        let inner = self.shared.inner.lock().unwrap();
        match inner.state {
            StreamState::Ended => Poll::Ready(Ok(())),
            StreamState::Errored => Poll::Ready(Err(self.terminal_error(&inner))),
            _ => Poll::Pending,
        }
    }

    /// The error a writer sees for a bridge that no longer accepts data.
    fn terminal_error(&self, inner: &Inner) -> BridgeError {
        match &inner.cause {
            Some(cause) => BridgeError::Source(cause.clone()),
            None => BridgeError::Closed { state: inner.state },
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock().unwrap();
        f.debug_struct("Bridge")
            .field("state", &inner.state)
            .field("queued", &inner.queue.len())
            .field("paused", &inner.paused)
            .finish_non_exhaustive()
    }
}
