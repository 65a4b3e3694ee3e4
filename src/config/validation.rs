//! Configuration validation logic
//!
//! This module validates configuration values before the application
//! starts, collecting errors and warnings per section.

use reqwest::Url;
use tracing::{debug, warn};

use super::models::{
    AppConfig, DatabaseConfig, EnvironmentConfig, LiquidityBookConfig, SecurityConfig,
    SessionBackend, SessionConfig, SolanaConfig, TelegramConfig,
};
use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::utils::crypto::KdfParams;

/// Configuration validator
pub struct ConfigValidator {
    /// Strict validation mode (fails on warnings)
    strict_mode: bool,

    /// Collect all validation errors instead of failing fast
    collect_all_errors: bool,
}

/// Validation result with warnings and errors
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Fatal validation errors
    pub errors: Vec<String>,

    /// Non-fatal warnings
    pub warnings: Vec<String>,

    /// Validation passed
    pub is_valid: bool,
}

impl ConfigValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            strict_mode: false,
            collect_all_errors: true,
        }
    }

    /// Enable strict validation mode
    pub fn with_strict_mode(mut self) -> Self {
        self.strict_mode = true;
        self
    }

    /// Enable fail-fast mode (stop on first error)
    pub fn with_fail_fast(mut self) -> Self {
        self.collect_all_errors = false;
        self
    }

    /// Validate the complete application configuration
    pub fn validate(&self, config: &AppConfig) -> AppResult<ValidationResult> {
        debug!("🔍 Starting configuration validation");

        let mut result = ValidationResult {
            errors: Vec::new(),
            warnings: Vec::new(),
            is_valid: true,
        };

        self.validate_environment(&config.environment, &mut result)?;
        self.validate_solana(&config.solana, &mut result)?;
        self.validate_liquidity_book(&config.liquidity_book, &mut result)?;
        self.validate_database(&config.database, &mut result)?;
        self.validate_session(&config.session, &mut result)?;
        self.validate_telegram(&config.telegram, &mut result)?;
        self.validate_security(&config.security, &mut result)?;
        self.validate_production(config, &mut result)?;

        result.is_valid = result.errors.is_empty() && (!self.strict_mode || result.warnings.is_empty());

        if result.is_valid {
            debug!("✅ Configuration validation passed");
        } else {
            warn!("❌ Configuration validation failed");
            for error in &result.errors {
                warn!("   Error: {}", error);
            }
            for warning in &result.warnings {
                warn!("   Warning: {}", warning);
            }
        }

        Ok(result)
    }

    fn validate_environment(&self, config: &EnvironmentConfig, result: &mut ValidationResult) -> AppResult<()> {
        match config.name.as_str() {
            "development" | "staging" | "production" | "test" => {}
            other => self.add_error(result, format!("Unknown environment '{other}'"))?,
        }

        match config.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => self.add_error(result, format!("Invalid log level '{other}'"))?,
        }

        match config.log_format.as_str() {
            "json" | "pretty" | "compact" => {}
            _ => self.add_error(
                result,
                format!(
                    "Invalid log format '{}'. Must be 'json', 'pretty', or 'compact'",
                    config.log_format
                ),
            )?,
        }

        if config.debug_mode && config.name == "production" {
            self.add_warning(result, "Debug mode enabled in production environment");
        }

        Ok(())
    }

    fn validate_solana(&self, config: &SolanaConfig, result: &mut ValidationResult) -> AppResult<()> {
        if let Err(e) = validate_url(&config.rpc_url) {
            self.add_error(result, format!("Solana RPC URL: {e}"))?;
        }

        match config.commitment.as_str() {
            "processed" | "confirmed" | "finalized" => {}
            other => self.add_error(result, format!("Invalid commitment level '{other}'"))?,
        }

        Ok(())
    }

    fn validate_liquidity_book(&self, config: &LiquidityBookConfig, result: &mut ValidationResult) -> AppResult<()> {
        if let Err(e) = validate_url(&config.base_url) {
            self.add_error(result, format!("Liquidity book URL: {e}"))?;
        }

        if config.quote_routes.is_empty() {
            self.add_warning(result, "No quote routes configured, every quote will be a constant-product estimate");
        }

        if config.slippage_bps == 0 || config.slippage_bps > 10_000 {
            self.add_error(result, format!("Slippage must be 1..=10000 bps, got {}", config.slippage_bps))?;
        } else if config.slippage_bps > 1_000 {
            self.add_warning(result, "Slippage above 10% configured");
        }

        if config.top_pools == 0 {
            self.add_error(result, "Top pools count must be positive".to_string())?;
        }

        if config.default_rate_price <= 0.0 || !config.default_rate_price.is_finite() {
            self.add_error(result, "Default rate price must be a positive number".to_string())?;
        }

        Ok(())
    }

    fn validate_database(&self, config: &DatabaseConfig, result: &mut ValidationResult) -> AppResult<()> {
        if config.url.trim().is_empty() {
            self.add_warning(result, "No database URL configured, wallets are kept in memory only");
            return Ok(());
        }

        if !config.url.starts_with("postgres://") && !config.url.starts_with("postgresql://") {
            self.add_error(result, "Database URL must be a postgres:// URL".to_string())?;
        }

        if config.min_connections > config.max_connections {
            self.add_error(
                result,
                format!(
                    "Database min_connections ({}) exceeds max_connections ({})",
                    config.min_connections, config.max_connections
                ),
            )?;
        }

        Ok(())
    }

    fn validate_session(&self, config: &SessionConfig, result: &mut ValidationResult) -> AppResult<()> {
        if config.backend == SessionBackend::Redis {
            if config.redis_url.trim().is_empty() {
                self.add_error(result, "Redis session backend selected without a redis_url".to_string())?;
            } else if !config.redis_url.starts_with("redis://") && !config.redis_url.starts_with("rediss://") {
                self.add_error(result, "Redis URL must start with redis:// or rediss://".to_string())?;
            }
        }

        if config.ttl_seconds == 0 {
            self.add_error(result, "Session TTL must be positive".to_string())?;
        }

        Ok(())
    }

    fn validate_telegram(&self, config: &TelegramConfig, result: &mut ValidationResult) -> AppResult<()> {
        if config.bot_token.trim().is_empty() {
            self.add_error(result, "Telegram bot token is required".to_string())?;
        } else if !config.bot_token.contains(':') {
            self.add_error(result, "Telegram bot token has an unexpected format".to_string())?;
        }

        if !config.delete_password_messages {
            self.add_warning(result, "Password messages will stay in chat history");
        }

        Ok(())
    }

    fn validate_security(&self, config: &SecurityConfig, result: &mut ValidationResult) -> AppResult<()> {
        if config.argon2_iterations == 0 || config.argon2_parallelism == 0 {
            self.add_error(result, "Argon2 iterations and parallelism must be positive".to_string())?;
        }

        if config.argon2_memory_kib < 8 * config.argon2_parallelism {
            self.add_error(result, "Argon2 memory must be at least 8 KiB per lane".to_string())?;
        }

        Ok(())
    }

    fn validate_production(&self, config: &AppConfig, result: &mut ValidationResult) -> AppResult<()> {
        if !config.is_production() {
            return Ok(());
        }

        if config.uses_in_memory_wallets() {
            self.add_error(result, "Production requires a PostgreSQL wallet store".to_string())?;
        }

        if config.security.argon2_memory_kib < KdfParams::default().memory_kib {
            self.add_error(
                result,
                format!(
                    "Argon2 memory cost {} KiB is below the production minimum of {} KiB",
                    config.security.argon2_memory_kib,
                    KdfParams::default().memory_kib
                ),
            )?;
        }

        if config.session.backend == SessionBackend::Memory {
            self.add_warning(result, "In-memory sessions are lost on restart and not shared between instances");
        }

        Ok(())
    }

    /// Add an error to the validation result
    fn add_error(&self, result: &mut ValidationResult, message: String) -> AppResult<()> {
        result.is_valid = false;

        if !self.collect_all_errors {
            let error = AppError::validation(message.clone());
            result.errors.push(message);
            return Err(error);
        }

        result.errors.push(message);
        Ok(())
    }

    /// Add a warning to the validation result
    fn add_warning(&self, result: &mut ValidationResult, message: &str) {
        result.warnings.push(message.to_string());

        if self.strict_mode {
            result.is_valid = false;
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("'{raw}' is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

impl AppConfig {
    /// Validate this configuration using the default validator
    pub fn validate(&self) -> AppResult<ValidationResult> {
        ConfigValidator::new().validate(self)
    }

    /// Whether the configuration passes default validation
    pub fn is_valid(&self) -> bool {
        self.validate().map(|r| r.is_valid).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::ConfigLoader;

    fn valid_config() -> AppConfig {
        let mut config = ConfigLoader::new().create_default_config();
        config.telegram.bot_token = "123456:ABCDEF".to_string();
        config
    }

    #[test]
    fn test_default_config_with_token_is_valid() {
        let result = ConfigValidator::new().validate(&valid_config()).unwrap();
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_missing_token_is_error() {
        let mut config = valid_config();
        config.telegram.bot_token.clear();

        let result = config.validate().unwrap();
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("bot token")));
    }

    #[test]
    fn test_production_rejects_in_memory_store_and_weak_kdf() {
        let mut config = valid_config();
        config.environment.name = "production".to_string();
        config.environment.debug_mode = false;
        config.security.argon2_memory_kib = 1024;

        let result = config.validate().unwrap();
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("PostgreSQL")));
        assert!(result.errors.iter().any(|e| e.contains("Argon2 memory cost")));
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut config = valid_config();
        config.session.backend = SessionBackend::Redis;

        let result = config.validate().unwrap();
        assert!(result.errors.iter().any(|e| e.contains("redis_url")));
    }

    #[test]
    fn test_fail_fast_returns_first_error() {
        let mut config = valid_config();
        config.solana.rpc_url = "not a url".to_string();

        let err = ConfigValidator::new().with_fail_fast().validate(&config).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_strict_mode_fails_on_warnings() {
        let result = ConfigValidator::new().with_strict_mode().validate(&valid_config()).unwrap();
        assert!(!result.is_valid);
    }
}
