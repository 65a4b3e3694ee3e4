//! Saros liquidity-book integration
//!
//! The SDK itself runs behind an HTTP gateway; [`HttpLiquidityBook`] talks to
//! it and [`QuoteService`] turns its loosely shaped answers into
//! [`SwapQuote`](crate::core::types::SwapQuote)s.

pub mod client;
pub mod quote;
pub mod tokens;
pub mod types;

pub use client::HttpLiquidityBook;
pub use quote::QuoteService;
pub use types::{
    CreatePairRequest, CreatedPair, PoolMetadata, PositionInfo, QuoteRequest, RawQuote, SwapRequest,
    UnsignedTransaction,
};

use async_trait::async_trait;

use crate::core::result::AppResult;

/// Operations the bot needs from the liquidity-book SDK
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiquidityBook: Send + Sync {
    /// Addresses of every pool
    async fn fetch_pool_addresses(&self) -> AppResult<Vec<String>>;

    /// Metadata of one pool
    async fn fetch_pool_metadata(&self, pool: &str) -> AppResult<PoolMetadata>;

    /// Ask the candidate quote routes in order; `None` when none of them exists
    async fn quote(&self, request: &QuoteRequest) -> AppResult<Option<RawQuote>>;

    /// Unsigned swap transaction
    async fn build_swap_transaction(&self, request: &SwapRequest) -> AppResult<UnsignedTransaction>;

    /// Positions `owner` holds in `pair`
    async fn user_positions(&self, owner: &str, pair: &str) -> AppResult<Vec<PositionInfo>>;

    /// Unsigned pair creation transaction and the address of the new pair
    async fn create_pair(&self, request: &CreatePairRequest) -> AppResult<CreatedPair>;
}
