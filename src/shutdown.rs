use std::sync::Arc;

use tokio::sync::watch;

/// Run-scoped "running" flag. Every clone observes the same run, so two
/// runs in one process never stop each other.
#[derive(Debug, Clone)]
pub struct RunSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for RunSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.tx.borrow()
    }

    /// Flip the flag to stopped. Returns `true` only for the call that
    /// actually stopped the run.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|running| {
            if *running {
                *running = false;
                true
            } else {
                false
            }
        })
    }

    /// Resolves once the run is stopped; immediately if it already is.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        drop(rx.wait_for(|running| !*running).await);
    }
}
