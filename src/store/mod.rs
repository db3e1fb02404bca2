//! Key-value store backends

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::KeyValueStore;

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;
