//! Key-value store for device preferences and session records
//!
//! This module provides the [`KeyValueStore`] seam every state service
//! persists through, and a durable implementation backed by sled.
//! Values are stored as UTF-8 strings; structured records go through the
//! JSON helpers on [`KeyValueStoreExt`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::sync::Arc;
use thiserror::Error;

/// Key-value store error types
#[derive(Debug, Error)]
pub enum KvError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Stored bytes are not valid UTF-8
    #[error("Value for key {0} is not valid UTF-8")]
    InvalidUtf8(String),

    /// The backing store cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Durable string-keyed storage shared by the state services
///
/// Implementations must be safe to share across tasks. Every operation is
/// attempted once; callers decide how to recover from a failure.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`, returning whether a value was present
    async fn remove(&self, key: &str) -> Result<bool>;
}

/// JSON helpers available on every [`KeyValueStore`]
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and deserialize a JSON value
    async fn get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a JSON value
    async fn set_json<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(KvError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for flushing only on write)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "lms_kv.db".to_string(),
            cache_capacity: 8 * 1024 * 1024, // 8MB
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Durable key-value store backed by sled
///
/// Writes and removals are flushed before they report success so that a
/// value survives an app restart as soon as the call returns.
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Db>,
}

impl KvStore {
    /// Open a key-value store with configuration
    pub fn new(config: KvConfig) -> Result<Self> {
        let mut db_config = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression);

        if let Some(ms) = config.flush_every_ms {
            db_config = db_config.flush_every_ms(Some(ms));
        }

        let db = db_config.open()?;
        tracing::debug!(path = %config.path, "opened key-value store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Create a temporary key-value store (for testing)
    pub fn in_memory() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl KeyValueStore for KvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match self.db.get(key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| KvError::InvalidUtf8(key.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let existed = self.db.remove(key.as_bytes())?.is_some();
        self.db.flush_async().await?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        name: String,
        count: i32,
    }

    #[tokio::test]
    async fn test_kv_store_creation() {
        let kv = KvStore::in_memory().unwrap();
        assert_eq!(kv.get(keys::USER).await.unwrap(), None);
        assert_eq!(kv.get(keys::THEME).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let kv = KvStore::in_memory().unwrap();

        kv.set("@theme", "dark").await.unwrap();

        assert_eq!(kv.get("@theme").await.unwrap(), Some("dark".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let kv = KvStore::in_memory().unwrap();
        assert_eq!(kv.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let kv = KvStore::in_memory().unwrap();

        kv.set("key", "value").await.unwrap();
        assert!(kv.remove("key").await.unwrap());
        assert_eq!(kv.get("key").await.unwrap(), None);

        assert!(!kv.remove("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let kv = KvStore::in_memory().unwrap();

        let err = kv.set("  ", "value").await.unwrap_err();
        assert!(matches!(err, KvError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let kv = KvStore::in_memory().unwrap();
        let record = TestRecord { name: "Alice".to_string(), count: 42 };

        kv.set_json("@user", &record).await.unwrap();

        let raw = kv.get("@user").await.unwrap().unwrap();
        assert!(raw.contains("\"name\":\"Alice\""));

        let loaded: Option<TestRecord> = kv.get_json("@user").await.unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn test_get_json_malformed() {
        let kv = KvStore::in_memory().unwrap();
        kv.set("@user", "{not json").await.unwrap();

        let result: Result<Option<TestRecord>> = kv.get_json("@user").await;
        assert!(matches!(result, Err(KvError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let kv = KvStore::in_memory().unwrap();

        kv.set("@theme", "light").await.unwrap();
        kv.set("@theme", "dark").await.unwrap();

        assert_eq!(kv.get("@theme").await.unwrap(), Some("dark".to_string()));
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kv").to_string_lossy().to_string();

        {
            let kv = KvStore::new(KvConfig::new(path.clone())).unwrap();
            kv.set("@onboarding_completed", "true").await.unwrap();
        }

        let kv = KvStore::new(KvConfig::new(path)).unwrap();
        assert_eq!(
            kv.get("@onboarding_completed").await.unwrap(),
            Some("true".to_string())
        );
    }

    #[test]
    fn test_config_builder() {
        let config = KvConfig::new("/tmp/lms")
            .cache_capacity(1024)
            .use_compression(false)
            .flush_every_ms(None);

        assert_eq!(config.path, "/tmp/lms");
        assert_eq!(config.cache_capacity, 1024);
        assert!(!config.use_compression);
        assert_eq!(config.flush_every_ms, None);
    }
}
