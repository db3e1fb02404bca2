//! In-memory key-value store
//!
//! This is primarily for development and testing.
//! For production, use RedisStore or another persistent store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::KeyValueStore;
use crate::error::SessionError;

struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(exp) => exp > now,
            None => true,
        }
    }
}

/// In-memory key-value store
///
/// Warning: This store is not suitable for production use because:
/// - Values are lost on server restart
/// - Values are not shared across multiple server instances
///
/// Clones share the same map. Every operation is counted, and the store can
/// be switched offline to simulate an unreachable backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
    operations: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value with no expiry, bypassing the operation counter
    pub fn seed<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        self.entries.write().insert(
            key.into(),
            StoredValue {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    /// Read a live value, bypassing the operation counter
    pub fn peek(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|stored| stored.is_live(now))
            .map(|stored| stored.value.clone())
    }

    /// Remaining lifetime of a key, `None` if missing or without expiry
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|stored| stored.is_live(now))
            .and_then(|stored| stored.expires_at)
            .map(|exp| exp.saturating_duration_since(now))
    }

    /// Number of store operations performed through the trait
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail with a store error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Clean up expired values
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.write().retain(|_, stored| stored.is_live(now));
    }

    fn begin(&self) -> Result<(), SessionError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(SessionError::StoreError("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.begin()?;
        Ok(self.peek(key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), SessionError> {
        self.begin()?;
        let stored = StoredValue {
            value: value.to_string(),
            expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
        };
        self.entries.write().insert(key.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.begin()?;
        self.entries.write().remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, SessionError> {
        self.begin()?;
        let now = Instant::now();
        let mut entries = self.entries.write();

        match entries.get_mut(key) {
            Some(stored) if stored.is_live(now) => {
                stored.expires_at = Some(now + Duration::from_secs(ttl_secs));
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();

        store.set_ex("session:test", "{}", 3600).await.unwrap();
        assert_eq!(store.get("session:test").await.unwrap(), Some("{}".to_string()));

        store.delete("session:test").await.unwrap();
        assert_eq!(store.get("session:test").await.unwrap(), None);
        assert_eq!(store.operation_count(), 4);
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryStore::new();

        store.set_ex("session:test", "{}", 0).await.unwrap(); // Already expired
        assert_eq!(store.get("session:test").await.unwrap(), None);
        assert!(!store.expire("session:test", 60).await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_refreshes_ttl() {
        let store = MemoryStore::new();
        store.seed("k", "v");
        assert_eq!(store.ttl("k"), None);

        assert!(store.expire("k", 120).await.unwrap());
        let ttl = store.ttl("k").unwrap();
        assert!(ttl > Duration::from_secs(110) && ttl <= Duration::from_secs(120));
        assert_eq!(store.peek("k").as_deref(), Some("v"));
        assert!(!store.expire("missing", 120).await.unwrap());
    }

    #[tokio::test]
    async fn test_offline() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.get("k").await,
            Err(SessionError::StoreError(_))
        ));
        store.set_offline(false);
        assert!(store.get("k").await.unwrap().is_none());
    }
}
