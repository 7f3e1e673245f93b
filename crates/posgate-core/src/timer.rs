//! Delayed tasks that are cancelled when their handle is dropped

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a spawned task. Dropping the handle aborts the task, so a
/// torn-down owner never receives late callbacks.
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Spawn a future on the current tokio runtime
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Send `event` on `sender` once `delay` has elapsed
    pub fn after<T>(delay: Duration, sender: mpsc::UnboundedSender<T>, event: T) -> Self
    where
        T: Send + 'static,
    {
        Self::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            // Receiver gone means the owner was torn down
            let _ = sender.send(event);
        })
    }

    /// Abort the task now
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
