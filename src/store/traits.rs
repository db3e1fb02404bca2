//! Key-value store trait

use async_trait::async_trait;

use crate::error::SessionError;

/// The subset of a key-value service the session layer relies on.
///
/// Each operation must be atomic on its own; no multi-key transactions are
/// required. Values are opaque strings.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Get the value at `key`, `None` if it does not exist or has expired
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Set `key` to `value`, expiring after `ttl_secs`, in one operation
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), SessionError>;

    /// Delete `key`; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), SessionError>;

    /// Reset the TTL of `key` without touching its value.
    ///
    /// Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, SessionError>;
}
