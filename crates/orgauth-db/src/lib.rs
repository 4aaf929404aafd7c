//! orgauth DB: SurrealDB record store and refresh-token store backends.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Record-store repositories for users and organizations
//! - Token-store backends ([`MemoryTokenStore`], and `RedisTokenStore`
//!   behind the `redis` feature)

mod connection;
mod error;
mod retry;
mod schema;

pub mod repository;
pub mod token_store;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
pub use token_store::{MemoryTokenStore, TokenStoreConfig};

#[cfg(feature = "redis")]
pub use token_store::RedisTokenStore;
