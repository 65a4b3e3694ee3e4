//! Core domain layer containing entities, value objects, and domain rules
//!
//! This module defines the fundamental building blocks of the swap bot
//! domain: the error taxonomy, result helpers, conversation and custody
//! types, and the storage contracts the rest of the crate is written
//! against.
//!
//! # Design Principles
//!
//! 1. **Independence**: nothing here talks to Telegram, Postgres or the SDK
//! 2. **Type Safety**: conversation steps and quotes are typed, not stringly maps

pub mod error;
pub mod repository;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorKind, ErrorSeverity};
pub use repository::{ConversationStore, WalletStore};
pub use result::{AppResult, ResultExt};
pub use types::*;

/// Domain constants and business rules
pub mod domain {
    /// Swap and pool browsing rules
    pub mod swap {
        /// Slippage tolerance used for quotes and swaps, in basis points
        pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

        /// Number of pools shown in listings
        pub const TOP_POOLS: usize = 5;

        /// Decimals assumed for mints that are not in the registry
        pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

        /// Decimals of native SOL
        pub const SOL_DECIMALS: u8 = 9;
    }

    /// Custody rules
    pub mod security {
        /// Argon2 salt size embedded in every blob
        pub const SALT_SIZE: usize = 16;

        /// AES-GCM nonce size
        pub const NONCE_SIZE: usize = 12;

        /// AES-GCM authentication tag size
        pub const TAG_SIZE: usize = 16;

        /// AES-256 key size
        pub const ENCRYPTION_KEY_SIZE: usize = 32;

        /// Smallest structurally valid blob (empty ciphertext)
        pub const MIN_BLOB_SIZE: usize = SALT_SIZE + NONCE_SIZE + TAG_SIZE;

        /// Minimum wallet password length
        pub const MIN_PASSWORD_LEN: usize = 8;
    }
}

/// Domain validation rules and helpers
pub mod validation {
    use super::domain::security::MIN_PASSWORD_LEN;
    use super::error::AppError;
    use super::result::{AppResult, ResultExt};
    use rust_decimal::Decimal;
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    /// Parse a user supplied amount, which must be a positive decimal
    pub fn parse_amount(text: &str) -> AppResult<Decimal> {
        let trimmed = text.trim();
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_validation_err("amount", || "Enter a valid number.".to_string())?;

        crate::ensure!(
            amount > Decimal::ZERO,
            AppError::validation("Amount must be greater than zero.").with_field("amount")
        );
        Ok(amount)
    }

    /// Validate a Solana address and return the parsed key
    pub fn parse_address(text: &str) -> AppResult<Pubkey> {
        let trimmed = text.trim();
        if trimmed.len() < 32 || trimmed.len() > 44 {
            crate::bail_validation!("Invalid address length: {}", trimmed.len());
        }

        Pubkey::from_str(trimmed)
            .map_err(|e| AppError::validation(format!("Invalid address: {e}")).with_field("address"))
    }

    /// Enforce the wallet password policy
    pub fn validate_password(password: &str) -> AppResult<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ))
            .with_field("password"));
        }
        Ok(())
    }

}
