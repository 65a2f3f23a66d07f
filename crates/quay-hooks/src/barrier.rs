use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::HookError;

struct Waiter {
    run_id: String,
    tx: oneshot::Sender<Option<serde_json::Value>>,
}

/// A named FIFO rendezvous point.
///
/// Waiters queue in arrival order; signals release the oldest waiter first.
/// Signals are not buffered: releasing an empty barrier is a no-op, and a
/// later `wait` blocks again.
#[derive(Default)]
pub struct Barrier {
    queue: Mutex<VecDeque<Waiter>>,
}

impl Barrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park until a signal delivers a payload or `ctx` is cancelled.
    ///
    /// A cancelled (or abandoned) waiter removes itself from the queue, so a
    /// later signal is not consumed by a dead entry.
    pub async fn wait(
        &self,
        ctx: &CancellationToken,
        run_id: &str,
    ) -> Result<Option<serde_json::Value>, HookError> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().push_back(Waiter {
            run_id: run_id.to_owned(),
            tx,
        });
        let _cleanup = WaitCleanup {
            barrier: self,
            run_id,
        };

        tokio::select! {
            delivered = rx => delivered.map_err(|_| HookError::Cancelled),
            _ = ctx.cancelled() => Err(HookError::Cancelled),
        }
    }

    /// Release the oldest waiter if any is queued; otherwise do nothing.
    pub fn try_signal_any(&self, payload: Option<serde_json::Value>) {
        let waiter = self.queue.lock().pop_front();
        if let Some(waiter) = waiter {
            let _ = waiter.tx.send(payload);
        }
    }

    /// Release every currently-queued waiter and empty the queue. Waiters
    /// arriving afterwards block again.
    pub fn signal_all(&self, payload: Option<serde_json::Value>) {
        let drained = std::mem::take(&mut *self.queue.lock());
        for waiter in drained {
            let _ = waiter.tx.send(payload.clone());
        }
    }

    /// Drop every queued waiter; each sees a cancellation error. Used at
    /// session teardown.
    pub fn fail_all(&self) {
        let drained = std::mem::take(&mut *self.queue.lock());
        drop(drained);
    }

    pub fn waiter_count(&self) -> usize {
        self.queue.lock().len()
    }
}

struct WaitCleanup<'a> {
    barrier: &'a Barrier,
    run_id: &'a str,
}

impl Drop for WaitCleanup<'_> {
    fn drop(&mut self) {
        // already gone when a signal popped the entry
        self.barrier
            .queue
            .lock()
            .retain(|waiter| waiter.run_id != self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn ctx() -> CancellationToken {
        CancellationToken::new()
    }

    #[tokio::test]
    async fn test_signal_any_releases_waiters_in_fifo_order() {
        let barrier = Arc::new(Barrier::new());
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();

        let b = barrier.clone();
        tokio::spawn(async move {
            b.wait(&ctx(), "first").await.unwrap();
            let _ = first_tx.send(());
        });
        while barrier.waiter_count() < 1 {
            tokio::task::yield_now().await;
        }

        let b = barrier.clone();
        tokio::spawn(async move {
            b.wait(&ctx(), "second").await.unwrap();
            let _ = second_tx.send(());
        });
        while barrier.waiter_count() < 2 {
            tokio::task::yield_now().await;
        }

        barrier.try_signal_any(None);
        first_rx.await.unwrap();
        assert_eq!(barrier.waiter_count(), 1);

        barrier.try_signal_any(None);
        second_rx.await.unwrap();
        assert_eq!(barrier.waiter_count(), 0);
    }

    #[tokio::test]
    async fn test_signal_on_empty_barrier_is_a_noop() {
        let barrier = Barrier::new();
        barrier.try_signal_any(None);
        barrier.signal_all(None);

        // no buffered signal: a fresh waiter still blocks
        let token = ctx();
        let wait = barrier.wait(&token, "late");
        tokio::pin!(wait);
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut wait)
            .await
            .is_err());

        token.cancel();
        assert!(matches!(wait.await, Err(HookError::Cancelled)));
    }

    #[tokio::test]
    async fn test_signal_all_releases_exactly_the_queued_waiters() {
        let barrier = Arc::new(Barrier::new());
        let mut done = Vec::new();

        for i in 0..3 {
            let b = barrier.clone();
            let (tx, rx) = oneshot::channel();
            done.push(rx);
            tokio::spawn(async move {
                let payload = b.wait(&ctx(), &format!("w{i}")).await.unwrap();
                let _ = tx.send(payload);
            });
        }
        while barrier.waiter_count() < 3 {
            tokio::task::yield_now().await;
        }

        barrier.signal_all(Some(serde_json::json!("go")));
        for rx in done {
            assert_eq!(rx.await.unwrap(), Some(serde_json::json!("go")));
        }
        assert_eq!(barrier.waiter_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_the_queue() {
        let barrier = Arc::new(Barrier::new());
        let token = ctx();

        let b = barrier.clone();
        let t = token.clone();
        let task = tokio::spawn(async move { b.wait(&t, "doomed").await });
        while barrier.waiter_count() < 1 {
            tokio::task::yield_now().await;
        }

        token.cancel();
        assert!(matches!(task.await.unwrap(), Err(HookError::Cancelled)));
        assert_eq!(barrier.waiter_count(), 0);

        // the queue really is empty: signalling now is a no-op
        barrier.try_signal_any(None);
    }

    #[tokio::test]
    async fn test_fail_all_cancels_queued_waiters() {
        let barrier = Arc::new(Barrier::new());

        let b = barrier.clone();
        let task = tokio::spawn(async move { b.wait(&ctx(), "torn-down").await });
        while barrier.waiter_count() < 1 {
            tokio::task::yield_now().await;
        }

        barrier.fail_all();
        assert!(matches!(task.await.unwrap(), Err(HookError::Cancelled)));
    }
}
