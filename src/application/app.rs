//! Main application structure and lifecycle management
//!
//! [`Application`] validates configuration, builds the service container and
//! runs the Telegram long-polling dispatcher until a shutdown signal arrives.

use std::sync::Arc;
use teloxide::dispatching::Dispatcher;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, instrument, warn};

use super::bot::{schema, Command, Router};
use crate::config::AppConfig;
use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::services::ServiceContainer;

/// Main application state and coordinator
pub struct Application {
    config: Arc<AppConfig>,
    services: ServiceContainer,
}

impl Application {
    /// Build a new application instance with the given configuration
    #[instrument(skip(config))]
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        info!("🏗️  Building application instance");

        let validation_result = config.validate()?;
        if !validation_result.is_valid {
            return Err(AppError::config(format!(
                "Configuration validation failed: {:?}",
                validation_result.errors
            )));
        }
        for warning in &validation_result.warnings {
            warn!("⚠️  Configuration warning: {}", warning);
        }

        let services = ServiceContainer::initialize(&config).await?;

        info!("✅ Application instance built successfully");
        Ok(Self {
            config: Arc::new(config),
            services,
        })
    }

    /// Poll Telegram until ctrl-c or SIGTERM, then release the services
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        info!("🚀 Starting Saros swap bot in {} mode", self.config.environment());

        let bot = Bot::new(self.config.telegram.bot_token.clone());
        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            warn!("Could not register bot commands: {}", e);
        }

        let router = Arc::new(Router::new(
            self.services.clone(),
            self.config.telegram.delete_password_messages,
        ));

        let mut dispatcher = Dispatcher::builder(bot, schema())
            .dependencies(dptree::deps![router])
            .default_handler(|update| async move {
                tracing::debug!("Unhandled update: {:?}", update.kind);
            })
            .error_handler(LoggingErrorHandler::with_custom_text("An error from the update handler"))
            .build();

        let shutdown = dispatcher.shutdown_token();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("🔄 Initiating graceful shutdown...");
            match shutdown.shutdown() {
                Ok(done) => done.await,
                Err(e) => warn!("Dispatcher was not running: {}", e),
            }
        });

        info!("✅ Bot is polling for updates");
        dispatcher.dispatch().await;

        self.shutdown().await?;
        info!("👋 Saros swap bot stopped");
        Ok(())
    }

    /// Release external resources
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> AppResult<()> {
        self.services.shutdown().await
    }

    /// Get application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Services backing the bot
    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => warn!("🛑 Received SIGTERM signal"),
                    _ = tokio::signal::ctrl_c() => warn!("🛑 Received SIGINT signal (Ctrl+C)"),
                }
            }
            Err(e) => {
                error!("Failed to register SIGTERM handler: {}", e);
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("🛑 Received SIGINT signal (Ctrl+C)");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Received Ctrl+C signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use assert_matches::assert_matches;

    fn test_config() -> AppConfig {
        let mut config = ConfigLoader::new().without_env().create_default_config();
        config.telegram.bot_token = "123456:test-token".to_string();
        config
    }

    #[tokio::test]
    async fn test_application_build() {
        let app = Application::build(test_config()).await.unwrap();

        assert_eq!(app.config().environment.name, "development");
        assert_eq!(app.services().settings.top_pools, 5);
        assert!(app.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_build_rejects_missing_token() {
        let config = ConfigLoader::new().without_env().create_default_config();

        let result = Application::build(config).await;

        assert_matches!(result.err(), Some(AppError::Config { .. }));
    }
}
