//! Result type definitions and utilities for the application
//!
//! This module provides convenient result type aliases and mapping helpers
//! for working with results throughout the swap bot.

use crate::core::error::AppError;

/// Application result type alias
///
/// # Examples
///
/// ```rust
/// use saros_swap_bot::core::result::AppResult;
/// use saros_swap_bot::core::error::AppError;
///
/// fn example_function() -> AppResult<String> {
///     Ok("Success".to_string())
/// }
///
/// fn failing_function() -> AppResult<()> {
///     Err(AppError::validation("Invalid input"))
/// }
/// ```
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Extension trait for `Result` to provide additional utility methods
pub trait ResultExt<T> {
    /// Map an error to a configuration error
    fn map_config_err<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;

    /// Map an error to a database error with operation context
    fn map_db_err(self, operation: &str) -> AppResult<T>;

    /// Map an error to an upstream error for the named collaborator
    fn map_upstream_err(self, service: &str) -> AppResult<T>;

    /// Map an error to a validation error with field context
    fn map_validation_err<F>(self, field: &str, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn map_config_err<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::config(format!("{}: {e}", f())))
    }

    fn map_db_err(self, operation: &str) -> AppResult<T> {
        self.map_err(|e| AppError::database(e.to_string(), operation))
    }

    fn map_upstream_err(self, service: &str) -> AppResult<T> {
        self.map_err(|e| AppError::upstream(service, e.to_string()))
    }

    fn map_validation_err<F>(self, field: &str, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|_| AppError::validation(f()).with_field(field))
    }
}

/// Macros for convenient error handling
#[macro_export]
macro_rules! bail_validation {
    ($msg:expr) => {
        return Err($crate::core::error::AppError::validation($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::core::error::AppError::validation(format!($fmt, $($arg)*)))
    };
}

/// Return early with the given error when the condition does not hold
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
