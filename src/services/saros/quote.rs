//! Swap quoting
//!
//! Finds the pool trading the requested pair, asks the SDK for a quote and
//! normalizes whatever shape it answers with. When the gateway exposes no
//! quote route at all, a constant-product estimate over the pool reserves is
//! returned instead and labelled as such.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::tokens::{self, ResolvedToken};
use super::types::{PoolMetadata, QuoteRequest, RawQuote, SwapRequest, LIQUIDITY_BOOK};
use super::LiquidityBook;
use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::core::types::{QuoteSource, SwapQuote};

/// Output amount fields, in the order they are trusted
const OUTPUT_FIELDS: [&str; 6] = ["amountOut", "amount_out", "outputAmount", "outputAmountRaw", "out", "amount"];

const BPS_DENOMINATOR: u64 = 10_000;

/// Quote engine over a [`LiquidityBook`]
#[derive(Clone)]
pub struct QuoteService {
    book: Arc<dyn LiquidityBook>,
    slippage_bps: u16,
}

impl QuoteService {
    /// Create a quote engine
    pub fn new(book: Arc<dyn LiquidityBook>, slippage_bps: u16) -> Self {
        Self { book, slippage_bps }
    }

    /// Quote selling `amount` of `input` for `output`
    ///
    /// `input` and `output` are registry symbols or raw mints.
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn quote(&self, input: &str, output: &str, amount: Decimal) -> AppResult<SwapQuote> {
        let input = tokens::resolve(input);
        let output = tokens::resolve(output);

        let pool = self.find_pool(&input, &output).await?;
        let swap_for_y = pool.base_mint == input.mint;

        let token_base_decimal = pool
            .extra
            .token_base_decimal
            .unwrap_or(if swap_for_y { input.decimals } else { output.decimals });
        let token_quote_decimal = pool
            .extra
            .token_quote_decimal
            .unwrap_or(if swap_for_y { output.decimals } else { input.decimals });
        let (in_decimals, out_decimals) = if swap_for_y {
            (token_base_decimal, token_quote_decimal)
        } else {
            (token_quote_decimal, token_base_decimal)
        };

        let amount_raw = to_minor_units(amount, in_decimals)?;

        let request = QuoteRequest {
            pair: pool.pool_address.clone(),
            token_base: pool.base_mint.clone(),
            token_quote: pool.quote_mint.clone(),
            amount: amount_raw,
            swap_for_y,
            is_exact_input: true,
            token_base_decimal,
            token_quote_decimal,
            slippage: self.slippage_bps,
        };

        let (output_raw, price_impact, fees, source) = match self.book.quote(&request).await? {
            Some(raw) => normalize(&raw)?,
            None => {
                let (out, impact) = constant_product_estimate(&pool, swap_for_y, amount_raw)
                    .map_err(|e| AppError::upstream(LIQUIDITY_BOOK, format!("Unable to produce quote: {e}")))?;
                warn!("⚠️  Quote for {} is a reserve-based estimate", pool.pool_address);
                (out, impact, 0.0, QuoteSource::ConstantProductEstimate)
            }
        };

        let output_amount = from_minor_units(output_raw, out_decimals)?;
        info!("💱 Quoted {} -> {} raw on {}", amount_raw, output_raw, pool.pool_address);

        Ok(SwapQuote {
            pool: pool.pool_address,
            token_base: pool.base_mint,
            token_quote: pool.quote_mint,
            amount,
            amount_raw,
            output_amount,
            output_raw,
            price_impact,
            fees,
            token_base_decimal,
            token_quote_decimal,
            swap_for_y,
            is_exact_input: true,
            hook: pool.extra.hook,
            source,
        })
    }

    /// Swap request executing `quote` for `payer`, with the slippage floor applied
    pub fn swap_request(&self, quote: &SwapQuote, payer: &str) -> SwapRequest {
        SwapRequest {
            token_mint_x: quote.token_base.clone(),
            token_mint_y: quote.token_quote.clone(),
            amount: quote.amount_raw,
            other_amount_offset: min_output(quote.output_raw, self.slippage_bps),
            swap_for_y: quote.swap_for_y,
            is_exact_input: quote.is_exact_input,
            pair: quote.pool.clone(),
            hook: quote.hook.clone(),
            payer: payer.to_string(),
        }
    }

    /// Scan pools in listing order for one trading the pair in either direction
    async fn find_pool(&self, input: &ResolvedToken, output: &ResolvedToken) -> AppResult<PoolMetadata> {
        let pools = self.book.fetch_pool_addresses().await?;
        if pools.is_empty() {
            return Err(AppError::upstream(LIQUIDITY_BOOK, "No pools available"));
        }

        for address in &pools {
            match self.book.fetch_pool_metadata(address).await {
                Ok(mut metadata) if metadata.matches(&input.mint, &output.mint) => {
                    if metadata.pool_address.is_empty() {
                        metadata.pool_address = address.clone();
                    }
                    debug!("Matched pool {}", address);
                    return Ok(metadata);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping pool {}: {}", address, e),
            }
        }

        Err(AppError::upstream(LIQUIDITY_BOOK, "No matching pool found for given token pair"))
    }
}

/// `floor(amount * 10^decimals)`
fn to_minor_units(amount: Decimal, decimals: u8) -> AppResult<u64> {
    let factor = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| AppError::upstream(LIQUIDITY_BOOK, format!("Unsupported token decimals: {decimals}")))?;
    let scaled = amount
        .checked_mul(Decimal::from(factor))
        .ok_or_else(|| AppError::validation("Amount is too large.").with_field("amount"))?;

    let raw = scaled
        .floor()
        .to_u64()
        .ok_or_else(|| AppError::validation("Amount is too large.").with_field("amount"))?;

    if raw == 0 {
        return Err(AppError::validation("Amount is smaller than the token's smallest unit.").with_field("amount"));
    }
    Ok(raw)
}

fn from_minor_units(raw: u64, decimals: u8) -> AppResult<Decimal> {
    Decimal::try_from_i128_with_scale(i128::from(raw), u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|e| AppError::upstream(LIQUIDITY_BOOK, format!("Unsupported token decimals {decimals}: {e}")))
}

/// Floor of the output after slippage
pub fn min_output(output_raw: u64, slippage_bps: u16) -> u64 {
    let kept = BPS_DENOMINATOR.saturating_sub(u64::from(slippage_bps));
    ((u128::from(output_raw) * u128::from(kept)) / u128::from(BPS_DENOMINATOR)) as u64
}

/// Read a raw amount out of a JSON number or digit string
fn raw_amount(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn loose_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Map an SDK quote body onto `(output_raw, price_impact, fees, source)`
fn normalize(raw: &RawQuote) -> AppResult<(u64, f64, f64, QuoteSource)> {
    let body = &raw.body;

    let output_raw = OUTPUT_FIELDS
        .iter()
        .find_map(|field| body.get(*field).filter(|v| !v.is_null()))
        .ok_or_else(|| AppError::upstream(LIQUIDITY_BOOK, "Quote response carries no output amount"))
        .and_then(|value| {
            raw_amount(value).ok_or_else(|| {
                AppError::upstream(LIQUIDITY_BOOK, format!("Quote output amount is not a number: {value}"))
            })
        })?;

    let price_impact = loose_f64(body.get("priceImpact").or_else(|| body.get("price_impact")));
    let fees = loose_f64(body.get("fees").or_else(|| body.get("fee")));

    Ok((output_raw, price_impact, fees, QuoteSource::Sdk { method: raw.route.clone() }))
}

/// `out = amount * reserve_out / (reserve_in + amount)` in minor units, with the
/// matching price impact in percent
fn constant_product_estimate(pool: &PoolMetadata, swap_for_y: bool, amount_raw: u64) -> Result<(u64, f64), String> {
    let (reserve_in, reserve_out) = if swap_for_y {
        (pool.base_reserve, pool.quote_reserve)
    } else {
        (pool.quote_reserve, pool.base_reserve)
    };

    if reserve_in == 0 || reserve_out == 0 {
        return Err("Pool reserves unavailable for fallback estimate".to_string());
    }

    let amount = u128::from(amount_raw);
    let denominator = reserve_in
        .checked_add(amount)
        .ok_or_else(|| "Pool reserves overflow".to_string())?;
    let out = amount
        .checked_mul(reserve_out)
        .ok_or_else(|| "Pool reserves overflow".to_string())?
        / denominator;

    let out = u64::try_from(out).map_err(|_| "Estimated output overflows".to_string())?;
    let impact = amount as f64 / denominator as f64 * 100.0;

    Ok((out, impact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::QuoteSource;
    use crate::services::saros::tokens::WSOL_MINT;
    use crate::services::saros::types::PoolExtra;
    use crate::services::saros::MockLiquidityBook;
    use assert_matches::assert_matches;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn sol_usdc_pool() -> PoolMetadata {
        PoolMetadata {
            pool_address: "pool-sol-usdc".into(),
            base_mint: WSOL_MINT.into(),
            quote_mint: USDC.into(),
            base_reserve: 1_000_000_000_000,
            quote_reserve: 150_000_000_000,
            trade_fee: 0.25,
            extra: PoolExtra { token_base_decimal: Some(9), token_quote_decimal: Some(6), hook: None },
        }
    }

    fn book_with_pools() -> MockLiquidityBook {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses()
            .returning(|| Ok(vec!["pool-other".into(), "pool-sol-usdc".into()]));
        book.expect_fetch_pool_metadata()
            .with(eq("pool-other"))
            .returning(|_| Err(AppError::upstream(LIQUIDITY_BOOK, "boom")));
        book.expect_fetch_pool_metadata()
            .with(eq("pool-sol-usdc"))
            .returning(|_| Ok(sol_usdc_pool()));
        book
    }

    #[tokio::test]
    async fn test_sdk_quote_is_normalized() {
        let mut book = book_with_pools();
        book.expect_quote()
            .withf(|r| r.amount == 10_000_000 && r.swap_for_y && r.slippage == 50)
            .returning(|_| {
                Ok(Some(RawQuote {
                    route: "getQuote".into(),
                    body: json!({ "amount_out": "1490000", "priceImpact": 0.01, "fee": "2500" }),
                }))
            });

        let service = QuoteService::new(Arc::new(book), 50);
        let quote = service.quote("SOL", "usdc", dec!(0.01)).await.unwrap();

        assert_eq!(quote.pool, "pool-sol-usdc");
        assert_eq!(quote.output_raw, 1_490_000);
        assert_eq!(quote.output_amount, dec!(1.49));
        assert_eq!(quote.fees, 2500.0);
        assert_eq!(quote.source, QuoteSource::Sdk { method: "getQuote".into() });
        assert!(!quote.is_estimate());
    }

    #[tokio::test]
    async fn test_reverse_direction_uses_quote_decimals_for_input() {
        let mut book = book_with_pools();
        book.expect_quote()
            .withf(|r| !r.swap_for_y && r.amount == 2_000_000)
            .returning(|_| Ok(Some(RawQuote { route: "quote".into(), body: json!({ "out": 13_000_000 }) })));

        let service = QuoteService::new(Arc::new(book), 50);
        let quote = service.quote("USDC", "SOL", dec!(2)).await.unwrap();

        assert_eq!(quote.output_amount, dec!(0.013));
    }

    #[tokio::test]
    async fn test_missing_routes_fall_back_to_estimate() {
        let mut book = book_with_pools();
        book.expect_quote().returning(|_| Ok(None));

        let service = QuoteService::new(Arc::new(book), 50);
        let quote = service.quote("SOL", "USDC", dec!(1)).await.unwrap();

        // 1e9 * 150e9 / (1e12 + 1e9)
        assert_eq!(quote.output_raw, 149_850_149);
        assert!(quote.is_estimate());
        assert!(quote.price_impact > 0.0);
    }

    #[tokio::test]
    async fn test_estimate_without_reserves_fails() {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses().returning(|| Ok(vec!["p".into()]));
        book.expect_fetch_pool_metadata().returning(|_| {
            Ok(PoolMetadata { base_reserve: 0, ..sol_usdc_pool() })
        });
        book.expect_quote().returning(|_| Ok(None));

        let service = QuoteService::new(Arc::new(book), 50);
        let err = service.quote("SOL", "USDC", dec!(1)).await.unwrap_err();

        assert_matches!(err, AppError::Upstream { ref message, .. }
            if message == "Unable to produce quote: Pool reserves unavailable for fallback estimate");
    }

    #[tokio::test]
    async fn test_no_matching_pool() {
        let mut book = book_with_pools();
        book.expect_quote().never();

        let service = QuoteService::new(Arc::new(book), 50);
        let err = service.quote("JUP", "USDT", dec!(1)).await.unwrap_err();

        assert_eq!(err.user_message(), "No matching pool found for given token pair");
    }

    #[tokio::test]
    async fn test_no_pools_at_all() {
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses().returning(|| Ok(vec![]));

        let service = QuoteService::new(Arc::new(book), 50);
        let err = service.quote("SOL", "USDC", dec!(1)).await.unwrap_err();

        assert_eq!(err.user_message(), "No pools available");
    }

    #[test]
    fn test_quote_without_output_field_is_rejected() {
        let raw = RawQuote { route: "getQuote".into(), body: json!({ "priceImpact": 1 }) };
        assert_matches!(normalize(&raw), Err(AppError::Upstream { .. }));

        let raw = RawQuote { route: "getQuote".into(), body: json!({ "amountOut": "lots" }) };
        assert_matches!(normalize(&raw), Err(AppError::Upstream { .. }));
    }

    #[test]
    fn test_output_field_priority() {
        let raw = RawQuote {
            route: "getQuote".into(),
            body: json!({ "amount": 1, "outputAmount": 2, "amountOut": null, "amount_out": 3 }),
        };
        assert_eq!(normalize(&raw).unwrap().0, 3);
    }

    #[test]
    fn test_minor_units_and_slippage() {
        assert_eq!(to_minor_units(dec!(0.0123456789), 9).unwrap(), 12_345_678);
        assert!(to_minor_units(dec!(0.0000001), 6).is_err());
        assert_eq!(min_output(1_000_000, 50), 995_000);
        assert_eq!(min_output(1_000_000, 0), 1_000_000);
    }

    #[test]
    fn test_swap_request_applies_slippage() {
        let service = QuoteService::new(Arc::new(MockLiquidityBook::new()), 100);
        let quote = SwapQuote {
            pool: "pool".into(),
            token_base: "base".into(),
            token_quote: "quote".into(),
            amount: dec!(1),
            amount_raw: 1_000,
            output_amount: dec!(2),
            output_raw: 2_000,
            price_impact: 0.0,
            fees: 0.0,
            token_base_decimal: 3,
            token_quote_decimal: 3,
            swap_for_y: true,
            is_exact_input: true,
            hook: Some("hook".into()),
            source: QuoteSource::ConstantProductEstimate,
        };

        let request = service.swap_request(&quote, "payer");
        assert_eq!(request.other_amount_offset, 1_980);
        assert_eq!(request.hook.as_deref(), Some("hook"));
        assert_eq!(request.token_mint_x, "base");
    }
}
