// file: src/tracker/cancel.rs
// description: cancellation handle tearing down poll intervals and stream readers
// reference: tokio watch channels

use tokio::sync::watch;

/// Owner side: calling [`CancelHandle::cancel`] stops every tracker loop
/// holding the paired token. Dropping the handle without cancelling leaves
/// the job running to its terminal state.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_resolves_waiters() {
        let (handle, mut token) = cancel_pair();
        assert!(!token.is_cancelled());

        handle.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("cancelled() should resolve after cancel()");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_never_cancels() {
        let (handle, mut token) = cancel_pair();
        drop(handle);

        let waited =
            tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(waited.is_err());
        assert!(!token.is_cancelled());
    }
}
