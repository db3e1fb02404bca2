//! Session error types

use std::fmt;

/// Errors that can occur during session operations
#[derive(Debug)]
pub enum SessionError {
    /// Error from the key-value store
    StoreError(String),
    /// Error during serialization/deserialization of the field map
    SerializationError(String),
    /// A caller passed an argument outside the accepted domain
    InvalidArgument(String),
    /// The lazy session factory already ran and failed
    Unavailable,
    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    RedisError(redis::RedisError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::StoreError(msg) => write!(f, "Session store error: {}", msg),
            SessionError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            SessionError::Unavailable => write!(f, "Session could not be loaded"),
            #[cfg(feature = "redis-store")]
            SessionError::RedisError(e) => write!(f, "Redis error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::RedisError(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerializationError(err.to_string())
    }
}
