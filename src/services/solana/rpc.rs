//! Solana RPC client implementation
//!
//! This module wraps the nonblocking Solana RPC client with request
//! limiting and error mapping.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient as SolanaRpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use super::LedgerClient;
use crate::config::models::SolanaConfig;
use crate::core::error::AppError;
use crate::core::result::AppResult;

/// Maximum concurrent RPC requests
const MAX_CONCURRENT_REQUESTS: usize = 10;

/// Map a configured commitment name to the RPC commitment
pub fn parse_commitment(name: &str) -> AppResult<CommitmentConfig> {
    match name {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(AppError::config(format!("Unknown commitment level: {other}"))),
    }
}

/// RPC client wrapper
#[derive(Clone)]
pub struct SolanaRpc {
    /// Inner Solana RPC client
    client: Arc<SolanaRpcClient>,
    /// Request semaphore for rate limiting
    semaphore: Arc<Semaphore>,
}

impl std::fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("url", &self.client.url())
            .finish_non_exhaustive()
    }
}

impl SolanaRpc {
    /// Create a new RPC client
    pub fn new(config: &SolanaConfig) -> AppResult<Self> {
        info!("🔗 Creating RPC client for: {}", config.rpc_url);

        let commitment = parse_commitment(&config.commitment)?;
        let client = SolanaRpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            Duration::from_millis(config.timeout_ms),
            commitment,
        );

        Ok(Self {
            client: Arc::new(client),
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    async fn permit(&self) -> AppResult<tokio::sync::SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| AppError::internal("Failed to acquire RPC semaphore"))
    }
}

#[async_trait]
impl LedgerClient for SolanaRpc {
    #[instrument(skip(self))]
    async fn latest_blockhash(&self) -> AppResult<Hash> {
        let _permit = self.permit().await?;
        let blockhash = self.client.get_latest_blockhash().await?;
        debug!("Fetched blockhash {}", blockhash);
        Ok(blockhash)
    }

    #[instrument(skip(self, transaction))]
    async fn send_and_confirm(&self, transaction: &Transaction) -> AppResult<Signature> {
        let _permit = self.permit().await?;
        let signature = self.client.send_and_confirm_transaction(transaction).await?;
        info!("✅ Transaction confirmed: {}", signature);
        Ok(signature)
    }

    #[instrument(skip(self))]
    async fn balance(&self, owner: &Pubkey) -> AppResult<u64> {
        let _permit = self.permit().await?;
        Ok(self.client.get_balance(owner).await?)
    }
}
