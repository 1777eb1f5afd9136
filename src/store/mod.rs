//! Session cache implementations

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::SessionCache;

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;
