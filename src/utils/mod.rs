//! Utility functions and helpers used throughout the application
//!
//! This module provides cryptographic primitives, telemetry setup and
//! command line parsing.

pub mod crypto;

// Re-export commonly used utilities
pub use crypto::{KdfParams, SecureKey};

/// Telemetry and observability utilities
pub mod telemetry {
    use anyhow::Result;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

    /// Initialize global tracing with the specified log level and format
    ///
    /// When `log_dir` is set, a JSON copy of every event is written to a
    /// daily-rotated file as well. The returned guard must be kept alive
    /// for the lifetime of the process or buffered file output is lost.
    pub fn init(log_level: &str, log_format: &str, log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level));

        let console: Box<dyn Layer<Registry> + Send + Sync> = match log_format {
            "json" => fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            "compact" => fmt::layer()
                .compact()
                .with_target(false)
                .with_thread_ids(false)
                .boxed(),
            _ => fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        };

        let (file_layer, guard) = match log_dir {
            Some(dir) => {
                let appender = tracing_appender::rolling::daily(dir, "swap-bot.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(non_blocking);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(console)
            .with(file_layer)
            .with(env_filter)
            .try_init()?;

        Ok(guard)
    }
}

/// Configuration argument parsing utilities
pub mod cli {
    use crate::config::models::SessionBackend;
    use clap::Parser;

    /// Command line arguments for the application
    #[derive(Parser, Debug, Clone, Default)]
    #[command(
        name = "swap-bot",
        about = "Telegram bot for custodial Solana wallets and Saros DLMM swaps",
        version = env!("CARGO_PKG_VERSION")
    )]
    pub struct CliArgs {
        /// Path to configuration file
        #[arg(short, long, env = "CONFIG_PATH")]
        pub config_path: Option<String>,

        /// Logging level (trace, debug, info, warn, error)
        #[arg(short, long, env = "LOG_LEVEL")]
        pub log_level: Option<String>,

        /// Log format (json, pretty, compact)
        #[arg(long, env = "LOG_FORMAT")]
        pub log_format: Option<String>,

        /// Directory for rotated log files
        #[arg(long, env = "LOG_DIR")]
        pub log_dir: Option<String>,

        /// Environment (development, staging, production)
        #[arg(short, long, env = "ENVIRONMENT")]
        pub environment: Option<String>,

        /// Session backend (memory, redis)
        #[arg(long, env = "SESSION_BACKEND")]
        pub session_backend: Option<SessionBackend>,
    }
}

// Re-export CLI utilities
pub use cli::CliArgs;
