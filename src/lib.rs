//! Saros Swap Bot Library
//!
//! A Telegram bot that keeps a password-encrypted Solana wallet per user and
//! lets them browse Saros DLMM pools, quote and execute swaps, create pairs
//! and list their liquidity positions.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  ┌─────────────────┐  ┌─────────────────┐                  │
//! │  │  Telegram bot   │  │      Flows      │                  │
//! │  └─────────────────┘  └─────────────────┘                  │
//! └─────────────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Services Layer                          │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Custody │ │  Quotes │ │  Saros  │ │ Solana  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                       │
//! │  ┌──────────┐ ┌─────────┐ ┌──────────┐                     │
//! │  │ Postgres │ │  Redis  │ │ Security │                     │
//! │  └──────────┘ └─────────┘ └──────────┘                     │
//! └─────────────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Core Layer                             │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │  Types  │ │  Errors │ │  Stores │ │Validation│          │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use saros_swap_bot::{config::ConfigLoader, Application};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load().await?;
//!     let app = Application::build(config).await?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Core modules - Domain types, errors and storage seams
pub mod core;

// Application layer - Telegram transport and conversation flows
pub mod application;

// Configuration management - Multi-source configuration loading
pub mod config;

// Infrastructure layer - Stores and encryption
pub mod infrastructure;

// Services layer - Custody, quoting and external clients
pub mod services;

// Utilities - Telemetry, CLI and key derivation
pub mod utils;

// Re-export commonly used types for convenience
pub use application::Application;
pub use config::{AppConfig, ConfigLoader};
pub use self::core::{
    error::AppError,
    result::AppResult,
    types::*,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
