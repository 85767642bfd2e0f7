//! Debounce and throttle timers
//!
//! [`Debouncer`] coalesces repeated requests into one delayed action that
//! runs with the latest value. [`Throttle`] rejects requests that arrive too
//! soon after the last accepted one. Both read time from `tokio::time`, so
//! tests can drive them with a paused clock.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Boxed future returned by debounced actions
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type Action<T> = Arc<dyn Fn(T) -> BoxFuture + Send + Sync>;

struct Pending<T> {
    value: T,
    generation: u64,
    task: JoinHandle<()>,
}

struct Slot<T> {
    generation: u64,
    pending: Option<Pending<T>>,
}

/// Timer that runs an action once calls stop arriving
///
/// Each [`schedule`](Debouncer::schedule) restarts the delay and replaces the
/// pending value. Pending work is cancelled when the debouncer is dropped;
/// call [`flush`](Debouncer::flush) first to run it instead.
///
/// Must be used from within a tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    action: Action<T>,
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer running `action` after `delay` of quiet
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let action: Action<T> = Arc::new(move |value| Box::pin(action(value)) as BoxFuture);

        Self {
            delay,
            action,
            slot: Arc::new(Mutex::new(Slot { generation: 0, pending: None })),
        }
    }

    /// Schedule the action with `value`, replacing any pending value
    pub fn schedule(&self, value: T) {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.pending.take() {
            previous.task.abort();
        }

        slot.generation += 1;
        let generation = slot.generation;
        let shared = Arc::downgrade(&self.slot);
        let action = Arc::downgrade(&self.action);
        let delay = self.delay;

        // The task only holds weak handles so an aborted timer never keeps
        // the action's captures alive.
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let (Some(shared), Some(action)) = (shared.upgrade(), action.upgrade()) else {
                return;
            };

            let value = {
                let mut slot = shared.lock();
                match slot.pending.take() {
                    Some(pending) if pending.generation == generation => Some(pending.value),
                    other => {
                        slot.pending = other;
                        None
                    }
                }
            };

            if let Some(value) = value {
                action(value).await;
            }
        });

        slot.pending = Some(Pending { value, generation, task });
    }

    /// Run the pending action now instead of waiting for the delay
    ///
    /// Returns whether anything was pending.
    pub async fn flush(&self) -> bool {
        let value = {
            let mut slot = self.slot.lock();
            slot.pending.take().map(|pending| {
                pending.task.abort();
                pending.value
            })
        };

        match value {
            Some(value) => {
                (self.action)(value).await;
                true
            }
            None => false,
        }
    }

    /// Whether an action is waiting for its delay
    pub fn is_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.slot.lock().pending.take() {
            pending.task.abort();
        }
    }
}

/// Gate that accepts at most one request per window
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create a throttle with the given window
    pub fn new(window: Duration) -> Self {
        Self { window, last: Mutex::new(None) }
    }

    /// Whether a request made now would be rejected
    pub fn is_throttled(&self) -> bool {
        !self.remaining().is_zero()
    }

    /// Time left until the next request is accepted
    fn remaining(&self) -> Duration {
        match *self.last.lock() {
            Some(last) => self.window.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Accept the request if the window has passed, starting a new window
    pub fn try_acquire(&self) -> bool {
        let mut last = self.last.lock();
        let now = Instant::now();

        if let Some(previous) = *last {
            if now.duration_since(previous) < self.window {
                return false;
            }
        }

        *last = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_debouncer(delay: Duration) -> (Debouncer<u32>, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let debouncer = Debouncer::new(delay, move |value| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(value);
            }
        });
        (debouncer, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_coalesces_to_latest() {
        let (debouncer, seen) = recording_debouncer(Duration::from_millis(500));

        debouncer.schedule(1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule(2);
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule(3);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(*seen.lock(), vec![3]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_waits_full_delay() {
        let (debouncer, seen) = recording_debouncer(Duration::from_millis(500));

        debouncer.schedule(7);
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(seen.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_flush_runs_immediately_once() {
        let (debouncer, seen) = recording_debouncer(Duration::from_millis(500));

        debouncer.schedule(5);
        assert!(debouncer.flush().await);
        assert_eq!(*seen.lock(), vec![5]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*seen.lock(), vec![5]);
        assert!(!debouncer.flush().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_drop_cancels() {
        let (debouncer, seen) = recording_debouncer(Duration::from_millis(500));

        debouncer.schedule(9);
        drop(debouncer);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(seen.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_window() {
        let throttle = Throttle::new(Duration::from_millis(700));

        assert!(!throttle.is_throttled());
        assert!(throttle.try_acquire());
        assert!(throttle.is_throttled());
        assert!(!throttle.try_acquire());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let remaining = throttle.remaining();
        assert!(remaining <= Duration::from_millis(400));
        assert!(remaining > Duration::from_millis(390));
        assert!(!throttle.try_acquire());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!throttle.is_throttled());
        assert!(throttle.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_rejections_do_not_extend_window() {
        let throttle = Throttle::new(Duration::from_millis(700));

        assert!(throttle.try_acquire());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!throttle.try_acquire());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(throttle.try_acquire());
    }
}
