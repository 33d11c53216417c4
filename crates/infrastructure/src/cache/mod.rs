//! Token cache adapters

mod memory;
mod redis;

pub use self::memory::InMemoryTokenCache;
pub use self::redis::RedisTokenCache;
