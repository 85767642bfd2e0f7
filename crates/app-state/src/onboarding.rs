//! First-run onboarding flag
//!
//! Completion is persisted under `@onboarding_completed`; only the exact
//! value `"true"` counts as completed.

use parking_lot::Mutex;
use std::sync::Arc;
use storage::{keys, KeyValueStore};
use tokio::sync::watch;

/// Persisted onboarding marker with change notification
pub struct OnboardingStore {
    store: Arc<dyn KeyValueStore>,
    completed: Mutex<Option<bool>>,
    tx: watch::Sender<bool>,
}

impl OnboardingStore {
    /// Create the flag over a store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _) = watch::channel(false);
        Self { store, completed: Mutex::new(None), tx }
    }

    /// Check whether onboarding has been completed
    ///
    /// A read error counts as not completed.
    pub async fn is_completed(&self) -> bool {
        let completed = match self.store.get(keys::ONBOARDING_COMPLETED).await {
            Ok(value) => value.as_deref() == Some(keys::ONBOARDING_COMPLETED_VALUE),
            Err(e) => {
                tracing::error!("Failed to read onboarding flag, assuming not completed: {}", e);
                false
            }
        };

        self.publish(completed);
        completed
    }

    /// Last value read or written, without touching the store
    pub fn cached(&self) -> Option<bool> {
        *self.completed.lock()
    }

    /// Mark onboarding as completed
    pub async fn complete(&self) -> storage::Result<()> {
        self.store
            .set(keys::ONBOARDING_COMPLETED, keys::ONBOARDING_COMPLETED_VALUE)
            .await?;
        tracing::info!("onboarding completed");
        self.publish(true);
        Ok(())
    }

    /// Clear the flag so onboarding shows again
    pub async fn reset(&self) -> storage::Result<()> {
        self.store.remove(keys::ONBOARDING_COMPLETED).await?;
        tracing::info!("onboarding reset");
        self.publish(false);
        Ok(())
    }

    /// Subscribe to flag changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    fn publish(&self, completed: bool) {
        *self.completed.lock() = Some(completed);
        self.tx.send_if_modified(|current| {
            let changed = *current != completed;
            *current = completed;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockStore;
    use storage::{KvError, MemoryStore};

    #[tokio::test]
    async fn test_only_exact_true_counts() {
        for (value, expected) in [("true", true), ("TRUE", false), ("1", false), ("", false)] {
            let store = MemoryStore::with_entries([(keys::ONBOARDING_COMPLETED, value)]);
            let flag = OnboardingStore::new(Arc::new(store));
            assert_eq!(flag.is_completed().await, expected, "value {:?}", value);
        }

        let flag = OnboardingStore::new(Arc::new(MemoryStore::new()));
        assert!(!flag.is_completed().await);
    }

    #[tokio::test]
    async fn test_complete_and_reset() {
        let store = MemoryStore::new();
        let flag = OnboardingStore::new(Arc::new(store.clone()));
        assert_eq!(flag.cached(), None);

        flag.complete().await.unwrap();
        assert_eq!(store.peek(keys::ONBOARDING_COMPLETED), Some("true".to_string()));
        assert!(flag.is_completed().await);
        assert_eq!(flag.cached(), Some(true));

        flag.reset().await.unwrap();
        assert!(!flag.is_completed().await);
    }

    #[tokio::test]
    async fn test_read_error_is_not_completed() {
        let mut mock = MockStore::new();
        mock.expect_get().returning(|_| Err(KvError::Unavailable("io".to_string())));

        let flag = OnboardingStore::new(Arc::new(mock));
        assert!(!flag.is_completed().await);
    }

    #[tokio::test]
    async fn test_subscribers_notified_on_change_only() {
        let flag = OnboardingStore::new(Arc::new(MemoryStore::new()));
        let mut rx = flag.subscribe();

        flag.is_completed().await;
        assert!(!rx.has_changed().unwrap());

        flag.complete().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
    }
}
