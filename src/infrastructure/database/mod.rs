//! Storage backends
//!
//! PostgreSQL and in-memory wallet stores, and the Redis conversation store.

pub mod memory;
pub mod postgres;
pub mod redis;

pub use self::memory::InMemoryWalletStore;
pub use self::postgres::{PostgresPool, PostgresWalletStore};
pub use self::redis::RedisConversationStore;
