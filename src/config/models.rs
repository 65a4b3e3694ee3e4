//! Configuration data structures and models
//!
//! This module defines the complete configuration structure for the swap
//! bot: every subsystem section with its serde defaults.

use crate::utils::crypto::KdfParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: EnvironmentConfig,

    /// Solana RPC configuration
    pub solana: SolanaConfig,

    /// Liquidity-book SDK gateway configuration
    pub liquidity_book: LiquidityBookConfig,

    /// Wallet store configuration
    pub database: DatabaseConfig,

    /// Conversation session configuration
    pub session: SessionConfig,

    /// Telegram bot configuration
    pub telegram: TelegramConfig,

    /// Custody configuration
    pub security: SecurityConfig,
}

/// Environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment name (development, staging, production)
    pub name: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log format (json, pretty, compact)
    pub log_format: String,

    /// Directory for daily-rotated log files, console only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Enable debug mode
    #[serde(default)]
    pub debug_mode: bool,
}

/// Solana RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    /// RPC endpoint URL
    pub rpc_url: String,

    /// Commitment level (processed, confirmed, finalized)
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_ms: u64,
}

/// Liquidity-book SDK gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityBookConfig {
    /// Base URL of the SDK gateway
    pub base_url: String,

    /// Quote routes tried in order until one exists
    #[serde(default = "default_quote_routes")]
    pub quote_routes: Vec<String>,

    /// Slippage tolerance in basis points
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,

    /// Pools shown in listings
    #[serde(default = "default_top_pools")]
    pub top_pools: usize,

    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Bin step used when creating a pair
    #[serde(default = "default_bin_step")]
    pub default_bin_step: u16,

    /// Initial price used when creating a pair
    #[serde(default = "default_rate_price")]
    pub default_rate_price: f64,
}

/// Wallet store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL, in-memory store when empty
    #[serde(default)]
    pub url: String,

    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_ms: u64,

    /// Idle timeout in milliseconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_ms: u64,

    /// Run migrations on startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

/// Where conversation state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Process-local map
    #[default]
    Memory,
    /// Shared Redis instance
    Redis,
}

impl fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Redis => f.write_str("redis"),
        }
    }
}

impl FromStr for SessionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("Unknown session backend: {other}")),
        }
    }
}

/// Conversation session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session backend
    #[serde(default)]
    pub backend: SessionBackend,

    /// Redis connection URL
    #[serde(default)]
    pub redis_url: String,

    /// Key prefix for Redis entries
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Lifetime of an idle conversation in seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    #[serde(default)]
    pub bot_token: String,

    /// Delete messages that carry a wallet password
    #[serde(default = "default_true")]
    pub delete_password_messages: bool,
}

/// Custody configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Argon2id memory cost in KiB
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,

    /// Argon2id passes
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2id lanes
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

impl SecurityConfig {
    /// Key derivation parameters for the secret codec
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// Default value functions
fn default_commitment() -> String { "confirmed".to_string() }
fn default_rpc_timeout() -> u64 { 30_000 }
fn default_quote_routes() -> Vec<String> {
    ["getTokenOutput", "getQuote", "getSwapQuote", "getEstimation", "quote"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}
fn default_slippage_bps() -> u16 { crate::core::domain::swap::DEFAULT_SLIPPAGE_BPS }
fn default_top_pools() -> usize { crate::core::domain::swap::TOP_POOLS }
fn default_request_timeout() -> u64 { 15_000 }
fn default_bin_step() -> u16 { 20 }
fn default_rate_price() -> f64 { 1.0 }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connection_timeout() -> u64 { 5000 }
fn default_idle_timeout() -> u64 { 300_000 }
fn default_key_prefix() -> String { "swapbot:".to_string() }
fn default_session_ttl() -> u64 { 3600 }
fn default_argon2_memory() -> u32 { KdfParams::default().memory_kib }
fn default_argon2_iterations() -> u32 { KdfParams::default().iterations }
fn default_argon2_parallelism() -> u32 { KdfParams::default().parallelism }
fn default_true() -> bool { true }

impl AppConfig {
    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.name == "development"
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.name == "production"
    }

    /// Get the environment name
    pub fn environment(&self) -> &str {
        &self.environment.name
    }

    /// Whether wallets are kept in process memory only
    pub fn uses_in_memory_wallets(&self) -> bool {
        self.database.url.trim().is_empty()
    }
}
