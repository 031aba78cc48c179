//! Hand-driven ticker for scheduler tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::scheduler::Ticker;

/// A [`Ticker`] that fires only when its [`TickHandle`] says so.
///
/// Dropping every handle closes the ticker.
pub struct ManualTicker {
    rx: mpsc::Receiver<()>,
}

/// Sender side of a [`ManualTicker`].
#[derive(Clone)]
pub struct TickHandle {
    tx: mpsc::Sender<()>,
}

impl ManualTicker {
    /// Create a ticker and the handle that drives it.
    pub fn new() -> (Self, TickHandle) {
        let (tx, rx) = mpsc::channel(16);
        (Self { rx }, TickHandle { tx })
    }
}

impl TickHandle {
    /// Fire one tick. Returns false if the ticker is gone.
    pub async fn tick(&self) -> bool {
        self.tx.send(()).await.is_ok()
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}
