use crate::{LspError, LspResult};

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative cancellation shared between the manager and a connect sequence.
#[derive(Clone, Debug)]
pub struct CancelToken {
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            cancel_tx: Arc::new(cancel_tx),
        }
    }

    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Resolve once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut cancel_rx = self.cancel_tx.subscribe();
        // The sender lives in self, so wait_for only fails if it was dropped
        let _ = cancel_rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run `future` unless cancelled first.
    pub async fn run<F, T>(&self, future: F) -> LspResult<T>
    where
        F: Future<Output = LspResult<T>>,
    {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(LspError::cancelled()),
            result = future => result,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
