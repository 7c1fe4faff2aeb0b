// Worker Shutdown Token
//
// One watch channel instead of a shared mutable flag: the driver flips
// it once, every worker sees it on its next poll.

use tokio::sync::watch;

/// Receiving half, cloned into each worker.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Sending half, held by the driver.
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to all workers
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_observes_shutdown() {
        let (tx, rx) = shutdown_channel();
        let second = rx.clone();

        assert!(!rx.is_shutdown());
        tx.shutdown();
        assert!(rx.is_shutdown());
        assert!(second.is_shutdown());
    }
}
