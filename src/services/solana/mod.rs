//! Solana blockchain service module
//!
//! This module provides the ledger operations the flows need: blockhashes,
//! transaction submission and SOL balances.

pub mod rpc;

pub use rpc::SolanaRpc;

use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::core::result::AppResult;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Ledger operations used by the flows
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Latest blockhash for signing
    async fn latest_blockhash(&self) -> AppResult<Hash>;

    /// Submit a signed transaction and wait for confirmation
    async fn send_and_confirm(&self, transaction: &Transaction) -> AppResult<Signature>;

    /// SOL balance of an account in lamports
    async fn balance(&self, owner: &Pubkey) -> AppResult<u64>;
}
