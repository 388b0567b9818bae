//! Cooperative shutdown signal shared by the coordinator and the binary

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable flag that flips once from running to shutting down
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Requests shutdown; every clone observes it
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has been requested
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        while !*receiver.borrow_and_update() {
            // The sender lives as long as any clone of this token
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clones_share_state() {
        let token = ShutdownToken::new();
        let clone = token.clone();
        assert!(!clone.is_triggered());

        token.trigger();
        assert!(clone.is_triggered());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiters() {
        let token = ShutdownToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_triggered() {
        let token = ShutdownToken::new();
        token.trigger();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .unwrap();
    }
}
