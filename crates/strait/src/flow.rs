//! Backpressure signal, producer-side view.

use tokio::sync::watch;

/// The bridge's pause/resume signal handed to a producing source.
///
/// `true` means pause. Sources read it before each push and await
/// [`FlowSignal::resumed`] instead of spinning when paused.
#[derive(Clone, Debug)]
pub struct FlowSignal {
    rx: watch::Receiver<bool>,
}

impl FlowSignal {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Whether the bridge is currently asking the producer to pause.
    pub fn is_paused(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the bridge is not asking for a pause. Returns
    /// immediately when already resumed, or when the bridge is gone.
    pub async fn resumed(&mut self) {
        while *self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
