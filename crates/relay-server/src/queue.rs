//! Queue store port.
//!
//! The relay only needs two list operations from its broker: append to the
//! tail of a list and take from the head with a bounded wait. Producers
//! append to the tail, so taking from the head preserves FIFO order.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("invalid queue address: {0}")]
    InvalidAddress(String),

    #[error("queue store unavailable: {0}")]
    Unavailable(String),
}

/// FIFO list store shared by the dispatcher and the consumer.
///
/// Implementations must tolerate concurrent calls from both ingress paths.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append `payload` to the tail of `queue` as a single atomic operation.
    async fn push_tail(&self, queue: &str, payload: &str) -> Result<(), QueueError>;

    /// Take the head of `queue`, waiting at most `wait`. `Ok(None)` means the
    /// wait elapsed with nothing to take.
    async fn pop_head(&self, queue: &str, wait: Duration) -> Result<Option<String>, QueueError>;

    /// Round-trip to the store to prove it is reachable.
    async fn ping(&self) -> Result<(), QueueError>;
}

// ---------------------------------------------------------------------------
// MemoryQueue
// ---------------------------------------------------------------------------

/// In-process queue store. Used by tests and for running without a broker.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    pushed: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `queue`, head first.
    pub async fn snapshot(&self, queue: &str) -> Vec<String> {
        self.lists
            .lock()
            .await
            .get(queue)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn len(&self, queue: &str) -> usize {
        self.lists.lock().await.get(queue).map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl QueueStore for MemoryQueue {
    async fn push_tail(&self, queue: &str, payload: &str) -> Result<(), QueueError> {
        self.lists
            .lock()
            .await
            .entry(queue.to_string())
            .or_default()
            .push_back(payload.to_string());
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn pop_head(&self, queue: &str, wait: Duration) -> Result<Option<String>, QueueError> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            // Register interest before checking so a push between the check
            // and the await is not missed.
            let pushed = self.pushed.notified();
            if let Some(payload) = self
                .lists
                .lock()
                .await
                .get_mut(queue)
                .and_then(VecDeque::pop_front)
            {
                return Ok(Some(payload));
            }
            if tokio::time::timeout_at(deadline, pushed).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ping(&self) -> Result<(), QueueError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn pop_returns_in_push_order() {
        let queue = MemoryQueue::new();
        queue.push_tail("q", "first").await.unwrap();
        queue.push_tail("q", "second").await.unwrap();

        let wait = Duration::from_millis(10);
        assert_eq!(queue.pop_head("q", wait).await.unwrap().as_deref(), Some("first"));
        assert_eq!(queue.pop_head("q", wait).await.unwrap().as_deref(), Some("second"));
        assert_eq!(queue.pop_head("q", wait).await.unwrap(), None);
    }

    #[tokio::test]
    async fn queues_are_independent() {
        let queue = MemoryQueue::new();
        queue.push_tail("a", "x").await.unwrap();
        assert_eq!(queue.len("a").await, 1);
        assert_eq!(queue.len("b").await, 0);
        assert!(queue.snapshot("b").await.is_empty());
    }

    #[tokio::test]
    async fn blocked_pop_wakes_on_push() {
        let queue = Arc::new(MemoryQueue::new());
        let reader = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop_head("q", Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push_tail("q", "late").await.unwrap();

        let got = reader.await.unwrap().unwrap();
        assert_eq!(got.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn pop_times_out_when_empty() {
        let queue = MemoryQueue::new();
        let started = std::time::Instant::now();
        let got = queue.pop_head("q", Duration::from_millis(30)).await.unwrap();
        assert!(got.is_none());
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
