//! Configuration management module
//!
//! This module loads the swap bot configuration from TOML, environment
//! variables and command-line arguments, and validates it before startup.

pub mod loader;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use loader::{load_config, load_config_with_args, ConfigLoader};
pub use models::{AppConfig, SessionBackend};
pub use validation::{ConfigValidator, ValidationResult};

// Re-export CLI args from utils for convenience
pub use crate::utils::CliArgs;
