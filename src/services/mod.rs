//! Services layer module
//!
//! This module contains the business services behind the bot flows: wallet
//! custody, conversation state, Solana RPC and the Saros liquidity-book
//! integration.

pub mod portfolio;
pub mod saros;
pub mod session;
pub mod solana;
pub mod wallet;

// Re-export commonly used types
pub use portfolio::{Portfolio, PortfolioService};
pub use saros::{HttpLiquidityBook, LiquidityBook, QuoteService};
pub use session::{IdentityLocks, MemoryConversationStore};
pub use solana::{LedgerClient, SolanaRpc};
pub use wallet::WalletCustody;

use crate::config::models::SessionBackend;
use crate::config::AppConfig;
use crate::core::repository::{ConversationStore, WalletStore};
use crate::core::result::AppResult;
use crate::infrastructure::database::{InMemoryWalletStore, PostgresWalletStore, RedisConversationStore};
use crate::infrastructure::security::SecretCodec;
use std::sync::Arc;

/// Tunables the flows read at runtime
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    /// Pools shown in listings
    pub top_pools: usize,
    /// Bin step for new pairs
    pub default_bin_step: u16,
    /// Initial price for new pairs
    pub default_rate_price: f64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            top_pools: crate::core::domain::swap::TOP_POOLS,
            default_bin_step: 20,
            default_rate_price: 1.0,
        }
    }
}

/// Services collection for dependency injection
#[derive(Clone)]
pub struct ServiceContainer {
    /// Wallet custody
    pub custody: Arc<WalletCustody>,
    /// Conversation state
    pub conversations: Arc<dyn ConversationStore>,
    /// Liquidity-book SDK
    pub book: Arc<dyn LiquidityBook>,
    /// Quote engine
    pub quotes: QuoteService,
    /// Position reader
    pub portfolio: PortfolioService,
    /// Solana ledger
    pub ledger: Arc<dyn LedgerClient>,
    /// Flow tunables
    pub settings: FlowSettings,
    /// Postgres handle kept for shutdown
    wallet_db: Option<PostgresWalletStore>,
}

impl ServiceContainer {
    /// Initialize all services
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        tracing::info!("🚀 Initializing service container");

        let (wallet_store, wallet_db): (Arc<dyn WalletStore>, _) = if config.uses_in_memory_wallets() {
            tracing::warn!("⚠️  DATABASE_URL not set, wallets are kept in memory only");
            (Arc::new(InMemoryWalletStore::new()), None)
        } else {
            let store = PostgresWalletStore::connect(&config.database).await?;
            (Arc::new(store.clone()), Some(store))
        };

        let conversations: Arc<dyn ConversationStore> = match config.session.backend {
            SessionBackend::Memory => Arc::new(MemoryConversationStore::new()),
            SessionBackend::Redis => Arc::new(RedisConversationStore::connect(&config.session).await?),
        };

        let book: Arc<dyn LiquidityBook> = Arc::new(HttpLiquidityBook::new(&config.liquidity_book)?);
        let ledger: Arc<dyn LedgerClient> = Arc::new(SolanaRpc::new(&config.solana)?);
        let codec = SecretCodec::new(config.security.kdf_params());

        let settings = FlowSettings {
            top_pools: config.liquidity_book.top_pools,
            default_bin_step: config.liquidity_book.default_bin_step,
            default_rate_price: config.liquidity_book.default_rate_price,
        };

        let mut container = Self::from_parts(
            wallet_store,
            codec,
            conversations,
            book,
            ledger,
            config.liquidity_book.slippage_bps,
            settings,
        );
        container.wallet_db = wallet_db;

        tracing::info!("✅ Service container initialized successfully");
        Ok(container)
    }

    /// Assemble a container from already built collaborators
    pub fn from_parts(
        wallet_store: Arc<dyn WalletStore>,
        codec: SecretCodec,
        conversations: Arc<dyn ConversationStore>,
        book: Arc<dyn LiquidityBook>,
        ledger: Arc<dyn LedgerClient>,
        slippage_bps: u16,
        settings: FlowSettings,
    ) -> Self {
        Self {
            custody: Arc::new(WalletCustody::new(wallet_store, codec)),
            conversations,
            quotes: QuoteService::new(book.clone(), slippage_bps),
            portfolio: PortfolioService::new(book.clone()),
            book,
            ledger,
            settings,
            wallet_db: None,
        }
    }

    /// Graceful shutdown of all services
    pub async fn shutdown(&self) -> AppResult<()> {
        tracing::info!("🛑 Shutting down services");

        if let Some(db) = &self.wallet_db {
            db.close().await;
        }

        tracing::info!("✅ Services shut down successfully");
        Ok(())
    }
}
