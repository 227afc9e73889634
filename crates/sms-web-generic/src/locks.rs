use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type LockMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// One async mutex per sender. Turns for the same sender queue up behind each
/// other; different senders never wait on one another. An entry lives only
/// while a turn holds or waits for it.
#[derive(Debug, Clone, Default)]
pub struct SenderLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Exclusive use of one sender's conversation. Released on drop.
#[derive(Debug)]
pub struct SenderGuard {
    sender: String,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `sender`'s conversation.
    pub async fn acquire(&self, sender: &str) -> SenderGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(sender.to_string()).or_default().clone()
        };
        SenderGuard {
            sender: sender.to_string(),
            locks: self.locks.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for SenderGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters hold their own clone, so a count of one means only the map is left.
        if locks
            .get(&self.sender)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.sender);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_sender_waits() {
        let locks = SenderLocks::new();
        let guard = locks.acquire("+15550001").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("+15550001").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_senders_do_not_wait() {
        let locks = SenderLocks::new();
        let _a = locks.acquire("+15550001").await;
        let acquired = tokio::time::timeout(Duration::from_millis(100), locks.acquire("+15550002")).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn idle_senders_are_forgotten() {
        let locks = SenderLocks::new();
        for i in 0..50 {
            let _guard = locks.acquire(&format!("+1555{i:04}")).await;
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn entry_kept_while_someone_waits() {
        let locks = SenderLocks::new();
        let first = locks.acquire("+15550001").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("+15550001").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.tracked(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }
}
