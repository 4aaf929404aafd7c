//! Refresh-token store backends.
//!
//! [`MemoryTokenStore`] is always available; `RedisTokenStore` requires
//! the `redis` feature.

mod config;
mod memory;

#[cfg(feature = "redis")]
mod redis;

pub use config::TokenStoreConfig;
pub use memory::MemoryTokenStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisTokenStore;
