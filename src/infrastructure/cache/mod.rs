//! Response cache backends.
//!
//! Volatile tier:
//! - [`MemoryCache`] - In-process map, used when Redis is not configured
//! - [`RedisCache`] - Redis with native key expiry
//!
//! Durable tier:
//! - [`FileCache`] - One raw-body file per key

mod file_cache;
mod memory_cache;
mod redis_cache;

pub use file_cache::{DurableEntry, FileCache};
pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
