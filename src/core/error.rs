//! Application error types and error handling utilities
//!
//! This module defines the error taxonomy of the swap bot. Every failure a
//! flow engine can observe maps onto one of these variants, and each variant
//! knows how it should be surfaced to the end user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main application error type that encompasses all possible errors
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
    },

    /// Persistent store errors
    #[error("Database error: {message}")]
    Database {
        /// Human readable description
        message: String,
        /// Store operation that failed
        operation: String,
    },

    /// Bad user input (amount, address, password policy)
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description
        message: String,
        /// Offending field, when known
        field: Option<String>,
    },

    /// Missing wallet, pool or record
    #[error("Not found: {message}")]
    NotFound {
        /// Human readable description
        message: String,
        /// Kind of entity that was looked up
        entity: String,
    },

    /// A record for this identity already exists
    #[error("Already exists: {message}")]
    AlreadyExists {
        /// Human readable description
        message: String,
    },

    /// Integrity tag did not verify (wrong password or tampered blob)
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human readable description
        message: String,
    },

    /// Encrypted blob is structurally invalid
    #[error("Format error: {message}")]
    Format {
        /// Human readable description
        message: String,
    },

    /// Liquidity-book SDK or RPC failure
    #[error("Upstream error: {service} - {message}")]
    Upstream {
        /// Collaborator that failed
        service: String,
        /// Upstream message
        message: String,
        /// HTTP status, when the collaborator speaks HTTP
        status_code: Option<u16>,
    },

    /// Telegram transport errors
    #[error("Telegram error: {message}")]
    Telegram {
        /// Human readable description
        message: String,
        /// Chat the request was addressed to
        chat_id: Option<i64>,
    },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal {
        /// Human readable description
        message: String,
        /// Component that raised the error
        component: Option<String>,
    },
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Expected user mistakes
    Low,
    /// Recoverable collaborator trouble
    Medium,
    /// Failures that block a user action
    High,
    /// Failures that need operator attention
    Critical,
}

/// Error category, mirrors the recovery policy of the flow engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Configuration and setup errors
    Configuration,
    /// Database and persistence errors
    Persistence,
    /// Input errors recovered by re-prompting
    Validation,
    /// Lookup misses surfaced with a directive
    Missing,
    /// Custody failures (decryption, integrity)
    Custody,
    /// External service integration errors
    Integration,
    /// System and infrastructure errors
    System,
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new database error
    pub fn database<S: Into<String>, O: Into<String>>(message: S, operation: O) -> Self {
        Self::Database {
            message: message.into(),
            operation: operation.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new not-found error for the given entity kind
    pub fn not_found<S: Into<String>, E: Into<String>>(entity: E, message: S) -> Self {
        Self::NotFound {
            message: message.into(),
            entity: entity.into(),
        }
    }

    /// Create a new already-exists error
    pub fn already_exists<S: Into<String>>(message: S) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a new format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new telegram error
    pub fn telegram<S: Into<String>>(message: S) -> Self {
        Self::Telegram {
            message: message.into(),
            chat_id: None,
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            component: None,
        }
    }

    /// Attach the offending field to a validation error
    #[must_use]
    pub fn with_field<S: Into<String>>(mut self, name: S) -> Self {
        if let Self::Validation { field, .. } = &mut self {
            *field = Some(name.into());
        }
        self
    }

    /// Attach an HTTP status to an upstream error
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        if let Self::Upstream { status_code, .. } = &mut self {
            *status_code = Some(status);
        }
        self
    }

    /// Get the error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Configuration,
            Self::Database { .. } => ErrorKind::Persistence,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } | Self::AlreadyExists { .. } => ErrorKind::Missing,
            Self::Authentication { .. } | Self::Format { .. } => ErrorKind::Custody,
            Self::Upstream { .. } | Self::Telegram { .. } => ErrorKind::Integration,
            Self::Internal { .. } => ErrorKind::System,
        }
    }

    /// Get the error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation { .. } | Self::NotFound { .. } | Self::AlreadyExists { .. } => {
                ErrorSeverity::Low
            }
            Self::Upstream { .. } | Self::Telegram { .. } => ErrorSeverity::Medium,
            Self::Authentication { .. } | Self::Format { .. } => ErrorSeverity::High,
            Self::Config { .. } | Self::Database { .. } | Self::Internal { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Whether the flow that hit this error should keep its current step
    ///
    /// Only validation failures are retried in place; everything else ends
    /// the flow.
    pub fn keeps_state(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Message shown to the end user for this error
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound { message, entity } if entity == "wallet" => {
                format!("{message}. Use /start to create a wallet first.")
            }
            Self::NotFound { message, .. } | Self::AlreadyExists { message } => message.clone(),
            Self::Authentication { .. } => {
                "Could not unlock your wallet: wrong password or corrupted key material.".to_string()
            }
            Self::Format { .. } => {
                "Stored wallet key material is unreadable. Please contact support.".to_string()
            }
            Self::Upstream { message, .. } => message.clone(),
            Self::Config { .. }
            | Self::Database { .. }
            | Self::Telegram { .. }
            | Self::Internal { .. } => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON serialization error: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("IO error: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let mut error = Self::upstream("liquidity-book", format!("HTTP request error: {err}"));
        if let Some(status) = err.status() {
            error = error.with_status(status.as_u16());
        }
        error
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string(), "query")
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        Self::database(err.to_string(), "session")
    }
}

impl From<teloxide::RequestError> for AppError {
    fn from(err: teloxide::RequestError) -> Self {
        Self::telegram(err.to_string())
    }
}

impl From<solana_client::client_error::ClientError> for AppError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::upstream("solana-rpc", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = AppError::config("Test configuration error");
        assert!(matches!(error, AppError::Config { .. }));
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_only_validation_keeps_state() {
        assert!(AppError::validation("Enter a valid number.").keeps_state());
        assert!(!AppError::upstream("sdk", "boom").keeps_state());
        assert!(!AppError::not_found("pool", "No pool").keeps_state());
        assert!(!AppError::authentication("bad tag").keeps_state());
    }

    #[test]
    fn test_user_messages() {
        let missing_wallet = AppError::not_found("wallet", "No wallet found");
        assert!(missing_wallet.user_message().contains("/start"));

        let upstream = AppError::upstream("liquidity-book", "No matching pool found for given token pair");
        assert_eq!(upstream.user_message(), "No matching pool found for given token pair");

        // Custody failures never echo internal details
        let auth = AppError::authentication("aead::Error");
        assert!(!auth.user_message().contains("aead"));
    }

    #[test]
    fn test_field_and_status_builders() {
        let error = AppError::validation("bad amount").with_field("amount");
        assert_matches::assert_matches!(error, AppError::Validation { field: Some(ref f), .. } if f == "amount");

        let error = AppError::upstream("liquidity-book", "gone").with_status(404);
        assert_matches::assert_matches!(error, AppError::Upstream { status_code: Some(404), .. });
    }
}
