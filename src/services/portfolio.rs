//! Liquidity position portfolio
//!
//! Walks every pool and collects the positions a wallet holds. A pool that
//! fails to answer is skipped, and pool titles are only a best-effort
//! enrichment.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::result::AppResult;
use crate::services::saros::tokens::symbol_for_mint;
use crate::services::saros::types::PositionInfo;
use crate::services::saros::LiquidityBook;

/// Positions held in one pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolPositions {
    /// Pool address
    pub pool: String,
    /// `BASE/QUOTE` label, when metadata was available
    pub title: Option<String>,
    /// Positions held in the pool
    pub positions: Vec<PositionInfo>,
}

/// Every position of one wallet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    /// Pools inspected
    pub pools_scanned: usize,
    /// Pools with at least one position
    pub pools: Vec<PoolPositions>,
}

impl Portfolio {
    /// Total number of positions
    pub fn position_count(&self) -> usize {
        self.pools.iter().map(|p| p.positions.len()).sum()
    }

    /// Whether the wallet has no position at all
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// `abcd...wxyz`
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..4], &address[address.len() - 4..])
}

fn token_label(mint: &str) -> String {
    symbol_for_mint(mint).map_or_else(|| short_address(mint), str::to_string)
}

/// Portfolio reader over a [`LiquidityBook`]
#[derive(Clone)]
pub struct PortfolioService {
    book: Arc<dyn LiquidityBook>,
}

impl PortfolioService {
    /// Create a portfolio reader
    pub fn new(book: Arc<dyn LiquidityBook>) -> Self {
        Self { book }
    }

    /// Collect the positions `owner` holds across all pools
    ///
    /// Only the pool listing itself is required to succeed.
    #[instrument(skip(self))]
    pub async fn positions(&self, owner: &str) -> AppResult<Portfolio> {
        let pools = self.book.fetch_pool_addresses().await?;
        let mut portfolio = Portfolio {
            pools_scanned: pools.len(),
            pools: Vec::new(),
        };

        for pool in pools {
            let positions = match self.book.user_positions(owner, &pool).await {
                Ok(positions) if !positions.is_empty() => positions,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Skipping positions of pool {}: {}", pool, e);
                    continue;
                }
            };

            let title = match self.book.fetch_pool_metadata(&pool).await {
                Ok(meta) => Some(format!("{}/{}", token_label(&meta.base_mint), token_label(&meta.quote_mint))),
                Err(e) => {
                    warn!("No metadata for pool {}: {}", pool, e);
                    None
                }
            };

            portfolio.pools.push(PoolPositions { pool, title, positions });
        }

        info!(
            "📊 Found {} positions across {} pools",
            portfolio.position_count(),
            portfolio.pools.len()
        );
        Ok(portfolio)
    }
}
