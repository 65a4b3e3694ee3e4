//! Security infrastructure module
//!
//! This module provides the at-rest protection of wallet secret keys.

pub mod encryption;

// Re-export commonly used types
pub use encryption::{EncryptionError, EncryptionResult, SecretCodec};
