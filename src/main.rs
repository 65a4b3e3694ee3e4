//! Saros Swap Bot
//!
//! Telegram front end for custodial Solana wallets and Saros DLMM swaps.
//!
//! Configuration comes from `configs/config.toml` (or `--config-path`),
//! `SWAPBOT_*` environment variables and a `.env` file, in increasing
//! precedence, with command line flags applied last.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use saros_swap_bot::{
    application::Application,
    config::{load_config_with_args, AppConfig, CliArgs},
    utils::telemetry,
};
use tracing::{error, info, instrument, warn};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // a missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli_args = CliArgs::parse();

    let config = load_config_with_args(cli_args)
        .await
        .wrap_err("Configuration loading failed")?;

    let _log_guard = telemetry::init(
        &config.environment.log_level,
        &config.environment.log_format,
        config.environment.log_dir.as_deref(),
    )
    .map_err(|e| color_eyre::eyre::eyre!(e))
    .wrap_err("Failed to initialize telemetry system")?;

    log_configuration_summary(&config);

    if let Err(e) = run(config).await {
        error!("❌ Application failed: {:?}", e);
        return Err(e);
    }
    Ok(())
}

#[instrument(name = "main_application", skip(config))]
async fn run(config: AppConfig) -> Result<()> {
    let app = Application::build(config)
        .await
        .wrap_err("Application initialization failed")?;

    info!("🎯 Swap bot initialized successfully");

    app.run().await.wrap_err("Application runtime error")
}

fn log_configuration_summary(config: &AppConfig) {
    info!("📊 Configuration Summary:");
    info!("   Environment: {}", config.environment.name);
    info!("   Solana RPC: {}", config.solana.rpc_url);
    info!("   Liquidity book: {}", config.liquidity_book.base_url);
    info!("   Slippage: {} bps", config.liquidity_book.slippage_bps);
    info!("   Session backend: {:?}", config.session.backend);
    if config.uses_in_memory_wallets() {
        warn!("⚠️  Wallets are kept in memory and lost on restart");
    }
}
