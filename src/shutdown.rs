use std::time::Duration;
use tokio::sync::watch;

/// Cancellation token shared between the signal handler and the trade loop
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Trigger side of [`Shutdown`]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// Resolve when Ctrl+C arrives
    pub fn on_ctrl_c() -> Shutdown {
        let (trigger, shutdown) = Shutdown::channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::warn!("⚠️  Received Ctrl+C, shutting down...");
                    trigger.trigger();
                }
                Err(e) => {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    // Keep the sender alive so the loop is not cancelled by a dropped channel
                    std::future::pending::<()>().await;
                }
            }
        });
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until triggered
    ///
    /// A dropped trigger counts as a shutdown request.
    pub async fn triggered(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    /// Sleep for `duration` unless shutdown comes first
    ///
    /// Returns `false` when the wait was cut short.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}
