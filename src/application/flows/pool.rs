//! Pool browsing: listing, one-shot details lookup and the positions view

use tracing::{debug, instrument};

use super::{Reply, ReplySink};
use crate::core::result::AppResult;
use crate::core::types::UserIdentity;
use crate::core::validation::parse_address;
use crate::services::portfolio::{short_address, Portfolio};
use crate::services::saros::PoolMetadata;
use crate::services::ServiceContainer;

const PROMPT_POOL_ADDRESS: &str = "Send the pool address you want details for.";
const NO_POOLS: &str = "No pools found.";

fn numbered(pools: &[String], limit: usize) -> String {
    pools
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, pool)| format!("{}. {}", i + 1, pool))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Details text of one pool
pub fn pool_details(address: &str, meta: &PoolMetadata) -> String {
    let decimals = |d: Option<u8>| d.map_or_else(|| "unknown".to_string(), |d| d.to_string());
    format!(
        "📊 Pool {address}\nBase mint: {}\nQuote mint: {}\nBase reserve: {}\nQuote reserve: {}\nBase decimals: {}\nQuote decimals: {}\nTrade fee: {}",
        meta.base_mint,
        meta.quote_mint,
        meta.base_reserve,
        meta.quote_reserve,
        decimals(meta.extra.token_base_decimal),
        decimals(meta.extra.token_quote_decimal),
        meta.trade_fee,
    )
}

/// Pool count and the first page of addresses
#[instrument(skip(services, sink))]
pub async fn list_pools(services: &ServiceContainer, sink: &dyn ReplySink) -> AppResult<()> {
    match services.book.fetch_pool_addresses().await {
        Ok(pools) if pools.is_empty() => sink.send(Reply::text(NO_POOLS)).await,
        Ok(pools) => {
            let top = services.settings.top_pools;
            sink.send(Reply::text(format!(
                "Found {} pools. Top {}:\n{}",
                pools.len(),
                top,
                numbered(&pools, top)
            )))
            .await
        }
        Err(e) => sink.send(Reply::text(format!("❌ Failed to fetch pools: {}", e.user_message()))).await,
    }
}

/// Wait for a pool address from this identity
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn request_details(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    services.conversations.mark_pool_pending(identity).await?;
    sink.send(Reply::text(PROMPT_POOL_ADDRESS)).await
}

/// Answer the text that followed a details request
///
/// The caller has already taken the identity out of the pending set.
#[instrument(skip(services, sink, text), fields(identity = %identity))]
pub async fn handle_pending_text(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    text: &str,
) -> AppResult<()> {
    let text = text.trim();
    if text.is_empty() {
        return show_first_pool(services, sink).await;
    }

    let lookup = async {
        let address = parse_address(text)?.to_string();
        let meta = services.book.fetch_pool_metadata(&address).await?;
        Ok::<_, crate::core::error::AppError>(pool_details(&address, &meta))
    }
    .await;

    match lookup {
        Ok(details) => sink.send(Reply::text(details)).await,
        Err(e) => {
            debug!("Pool lookup failed: {}", e);
            sink.send(Reply::text(format!("❌ Invalid Id or error: {}", e.user_message()))).await
        }
    }
}

async fn show_first_pool(services: &ServiceContainer, sink: &dyn ReplySink) -> AppResult<()> {
    let pools = match services.book.fetch_pool_addresses().await {
        Ok(pools) => pools,
        Err(e) => {
            return sink
                .send(Reply::text(format!("❌ Invalid Id or error: {}", e.user_message())))
                .await
        }
    };

    let Some(first) = pools.first() else {
        return sink.send(Reply::text(NO_POOLS)).await;
    };

    let top = services.settings.top_pools;
    sink.send(Reply::text(format!(
        "Found {} pools. Showing top {} pools:\n{}",
        pools.len(),
        top,
        numbered(&pools, top)
    )))
    .await?;
    sink.send(Reply::text(format!("Showing details for first pool: {first}"))).await?;

    match services.book.fetch_pool_metadata(first).await {
        Ok(meta) => sink.send(Reply::text(pool_details(first, &meta))).await,
        Err(e) => sink.send(Reply::text(format!("❌ Invalid Id or error: {}", e.user_message()))).await,
    }
}

fn portfolio_text(owner: &str, portfolio: &Portfolio) -> String {
    let mut text = format!(
        "Found {} positions across {} pools",
        portfolio.position_count(),
        portfolio.pools.len()
    );
    for pool in &portfolio.pools {
        let title = pool.title.clone().unwrap_or_else(|| short_address(&pool.pool));
        text.push_str(&format!("\n\n{title} ({})", short_address(&pool.pool)));
        for position in &pool.positions {
            text.push_str(&format!(
                "\n• {} bins [{}, {}]",
                short_address(&position.position_mint),
                position.lower_bin_id,
                position.upper_bin_id
            ));
        }
    }
    text.push_str(&format!("\n\nWallet: {owner}"));
    text
}

/// Liquidity positions of the identity's wallet
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn positions(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    let owner = match services.custody.public_key(identity).await {
        Ok(owner) => owner.to_string(),
        Err(e) => return sink.send(Reply::text(e.user_message())).await,
    };

    match services.portfolio.positions(&owner).await {
        Ok(portfolio) if portfolio.is_empty() => {
            sink.send(Reply::text(format!("No Saros DLMM positions found for wallet: {owner}"))).await
        }
        Ok(portfolio) => sink.send(Reply::text(portfolio_text(&owner, &portfolio))).await,
        Err(e) => sink.send(Reply::text(format!("❌ Failed to fetch positions: {}", e.user_message()))).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flows::testing::{services, services_with_wallet, RecordingSink};
    use crate::core::error::AppError;
    use crate::services::saros::types::{PoolExtra, PositionInfo};
    use crate::services::saros::MockLiquidityBook;
    use crate::services::solana::MockLedgerClient;
    use pretty_assertions::assert_eq;

    const POOL: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

    fn metadata() -> PoolMetadata {
        PoolMetadata {
            pool_address: POOL.into(),
            base_mint: "base".into(),
            quote_mint: "quote".into(),
            base_reserve: 10,
            quote_reserve: 20,
            trade_fee: 0.3,
            extra: PoolExtra { token_base_decimal: Some(9), token_quote_decimal: None, hook: None },
        }
    }

    #[tokio::test]
    async fn test_empty_text_with_no_pools() {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses().returning(|| Ok(vec![]));
        let services = services(book, MockLedgerClient::new());
        let identity = UserIdentity::new("7");
        let sink = RecordingSink::default();

        request_details(&services, &identity, &sink).await.unwrap();
        assert!(services.conversations.take_pool_pending(&identity).await.unwrap());
        handle_pending_text(&services, &identity, &sink, "  ").await.unwrap();

        assert_eq!(sink.texts(), vec![PROMPT_POOL_ADDRESS, NO_POOLS]);
        assert!(!services.conversations.take_pool_pending(&identity).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_text_shows_first_pool() {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses()
            .returning(|| Ok(vec![POOL.to_string(), "other".to_string()]));
        book.expect_fetch_pool_metadata().returning(|_| Ok(metadata()));
        let services = services(book, MockLedgerClient::new());
        let sink = RecordingSink::default();

        handle_pending_text(&services, &UserIdentity::new("7"), &sink, "").await.unwrap();

        let texts = sink.texts();
        assert_eq!(texts[0], format!("Found 2 pools. Showing top 5 pools:\n1. {POOL}\n2. other"));
        assert_eq!(texts[1], format!("Showing details for first pool: {POOL}"));
        assert!(texts[2].contains("Base decimals: 9\nQuote decimals: unknown"));
    }

    #[tokio::test]
    async fn test_address_lookup() {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_metadata().returning(|_| Ok(metadata()));
        let services = services(book, MockLedgerClient::new());
        let sink = RecordingSink::default();

        handle_pending_text(&services, &UserIdentity::new("7"), &sink, POOL).await.unwrap();

        assert_eq!(sink.last().text, pool_details(POOL, &metadata()));
    }

    #[tokio::test]
    async fn test_malformed_address_is_reported() {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_metadata().never();
        let services = services(book, MockLedgerClient::new());
        let sink = RecordingSink::default();

        handle_pending_text(&services, &UserIdentity::new("7"), &sink, "not-a-pool").await.unwrap();

        assert!(sink.last().text.starts_with("❌ Invalid Id or error: "));
    }

    #[tokio::test]
    async fn test_pool_listing_is_capped() {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses()
            .returning(|| Ok((1..=7).map(|i| format!("pool{i}")).collect()));
        let services = services(book, MockLedgerClient::new());
        let sink = RecordingSink::default();

        list_pools(&services, &sink).await.unwrap();

        let text = sink.last().text;
        assert!(text.starts_with("Found 7 pools. Top 5:\n1. pool1"));
        assert!(text.ends_with("5. pool5"));
    }

    #[tokio::test]
    async fn test_positions_without_any() {
        let identity = UserIdentity::new("7");
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses().returning(|| Ok(vec!["p1".into()]));
        book.expect_user_positions().returning(|_, _| Ok(vec![]));
        let services = services_with_wallet(book, MockLedgerClient::new(), &identity).await;
        let sink = RecordingSink::default();

        positions(&services, &identity, &sink).await.unwrap();

        let owner = services.custody.public_key(&identity).await.unwrap();
        assert_eq!(sink.last().text, format!("No Saros DLMM positions found for wallet: {owner}"));
    }

    #[tokio::test]
    async fn test_positions_summary() {
        let identity = UserIdentity::new("7");
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses().returning(|| Ok(vec![POOL.into()]));
        book.expect_user_positions().returning(|_, _| {
            Ok(vec![PositionInfo {
                position_mint: "PosMint1111111111111111111111111".into(),
                position: None,
                lower_bin_id: -5,
                upper_bin_id: 5,
            }])
        });
        book.expect_fetch_pool_metadata()
            .returning(|_| Err(AppError::upstream("liquidity-book", "down")));
        let services = services_with_wallet(book, MockLedgerClient::new(), &identity).await;
        let sink = RecordingSink::default();

        positions(&services, &identity, &sink).await.unwrap();

        let text = sink.last().text;
        assert!(text.starts_with("Found 1 positions across 1 pools"));
        assert!(text.contains("• PosM...1111 bins [-5, 5]"));
    }
}
