//! Infrastructure layer module
//!
//! This module contains the storage backends and the secret codec.

pub mod database;
pub mod security;

// Re-export commonly used types
pub use database::{InMemoryWalletStore, PostgresWalletStore, RedisConversationStore};
pub use security::{EncryptionError, SecretCodec};
