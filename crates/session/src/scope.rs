//! Page lifecycle cancellation

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation handle for one page's in-flight lookups
///
/// Clones share the same flag. Once cancelled, work started under the
/// scope is abandoned and writes nothing back.
#[derive(Clone, Debug)]
pub struct PageScope {
    tx: Arc<watch::Sender<bool>>,
}

impl PageScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Cancel (navigate away)
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once the scope is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for PageScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let scope = PageScope::new();
        let waiter = scope.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        assert!(!scope.is_cancelled());
        scope.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_immediately() {
        let scope = PageScope::new();
        scope.cancel();
        tokio::time::timeout(Duration::from_millis(50), scope.cancelled())
            .await
            .unwrap();
    }
}
