//! Redis key-value store
//!
//! Sessions live at `prefix + session_id` as a JSON object of string fields,
//! with the session TTL applied through `SET ... EX` and `EXPIRE`.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;

use super::KeyValueStore;
use crate::error::SessionError;

/// Redis-backed key-value store
///
/// # Example
///
/// ```rust,ignore
/// use expenses_session::RedisStore;
///
/// let client = redis::Client::open("redis://127.0.0.1/")?;
/// let store = RedisStore::new(client).await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<ConnectionManager>,
}

impl RedisStore {
    /// Create a new Redis store from a client
    pub async fn new(client: redis::Client) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis store from a connection string
    pub async fn from_url(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::StoreError(format!("Failed to create Redis client: {}", e)))?;
        Self::new(client).await
    }

    /// Create a new Redis store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn: Arc::new(conn),
        }
    }

    fn connection(&self) -> ConnectionManager {
        (*self.conn).clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.connection();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), SessionError> {
        let mut conn = self.connection();

        if ttl_secs > 0 {
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        } else {
            // Redis rejects EX 0; a zero lifetime means the value is already gone
            conn.del::<_, ()>(key).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        let mut conn = self.connection();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, SessionError> {
        let mut conn = self.connection();
        let ttl = i64::try_from(ttl_secs)
            .map_err(|e| SessionError::InvalidArgument(e.to_string()))?;
        let refreshed: bool = conn.expire(key, ttl).await?;
        Ok(refreshed)
    }
}
