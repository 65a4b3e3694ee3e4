//! Wire types of the liquidity-book gateway
//!
//! Pool metadata comes back from the SDK with loosely typed numbers (some
//! deployments send reserves as decimal strings, some as JSON numbers), so
//! the numeric fields accept both.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use solana_sdk::transaction::Transaction;

use crate::core::error::AppError;
use crate::core::result::AppResult;

/// Service name used in upstream errors
pub const LIQUIDITY_BOOK: &str = "liquidity-book";

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Unsigned(u64),
    Float(f64),
    Text(String),
}

/// Accept `123`, `123.0` or `"123"` as a raw token amount
fn de_raw_amount<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseNumber>::deserialize(deserializer)?;
    match value {
        None => Ok(0),
        Some(LooseNumber::Unsigned(v)) => Ok(u128::from(v)),
        Some(LooseNumber::Float(v)) if v.is_finite() && v >= 0.0 => Ok(v.trunc() as u128),
        Some(LooseNumber::Float(v)) => Err(serde::de::Error::custom(format!("invalid amount {v}"))),
        Some(LooseNumber::Text(s)) => s
            .trim()
            .parse::<u128>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount {s:?}"))),
    }
}

fn de_loose_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseNumber>::deserialize(deserializer)?;
    match value {
        None => Ok(0.0),
        Some(LooseNumber::Unsigned(v)) => Ok(v as f64),
        Some(LooseNumber::Float(v)) => Ok(v),
        Some(LooseNumber::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid number {s:?}"))),
    }
}

fn ser_as_string<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: std::fmt::Display,
{
    serializer.collect_str(value)
}

/// Decimals carried in the pool's `extra` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolExtra {
    /// Decimals of the base mint
    #[serde(default)]
    pub token_base_decimal: Option<u8>,
    /// Decimals of the quote mint
    #[serde(default)]
    pub token_quote_decimal: Option<u8>,
    /// Transfer hook program
    #[serde(default)]
    pub hook: Option<String>,
}

/// Pool metadata as reported by the SDK
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetadata {
    /// Pool address
    #[serde(default)]
    pub pool_address: String,
    /// Base mint
    pub base_mint: String,
    /// Quote mint
    pub quote_mint: String,
    /// Base reserve in minor units
    #[serde(default, deserialize_with = "de_raw_amount")]
    pub base_reserve: u128,
    /// Quote reserve in minor units
    #[serde(default, deserialize_with = "de_raw_amount")]
    pub quote_reserve: u128,
    /// Trade fee as reported
    #[serde(default, deserialize_with = "de_loose_f64")]
    pub trade_fee: f64,
    /// Optional decimals and hook
    #[serde(default)]
    pub extra: PoolExtra,
}

impl PoolMetadata {
    /// Whether the pool trades exactly these two mints, in either order
    pub fn matches(&self, mint_a: &str, mint_b: &str) -> bool {
        (self.base_mint == mint_a && self.quote_mint == mint_b)
            || (self.base_mint == mint_b && self.quote_mint == mint_a)
    }
}

/// Quote request sent to every candidate route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Pool address
    pub pair: String,
    /// Base mint
    pub token_base: String,
    /// Quote mint
    pub token_quote: String,
    /// Input amount in minor units
    #[serde(serialize_with = "ser_as_string")]
    pub amount: u64,
    /// Selling base for quote
    pub swap_for_y: bool,
    /// Exact-input swap
    pub is_exact_input: bool,
    /// Base mint decimals
    pub token_base_decimal: u8,
    /// Quote mint decimals
    pub token_quote_decimal: u8,
    /// Slippage in basis points
    pub slippage: u16,
}

/// Raw body of the first quote route that answered
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    /// Route name
    pub route: String,
    /// Response body, normalized later
    pub body: Value,
}

/// Swap transaction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// Base mint of the pool
    pub token_mint_x: String,
    /// Quote mint of the pool
    pub token_mint_y: String,
    /// Input amount in minor units
    #[serde(serialize_with = "ser_as_string")]
    pub amount: u64,
    /// Minimum output in minor units
    #[serde(serialize_with = "ser_as_string")]
    pub other_amount_offset: u64,
    /// Selling base for quote
    pub swap_for_y: bool,
    /// Exact-input swap
    pub is_exact_input: bool,
    /// Pool address
    pub pair: String,
    /// Transfer hook program
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    /// Fee payer and signer
    pub payer: String,
}

/// Token side of a pair creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairToken {
    /// Mint address
    pub mint_address: String,
    /// Mint decimals
    pub decimal: u8,
}

/// Pair creation request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePairRequest {
    /// Base token
    pub token_base: PairToken,
    /// Quote token
    pub token_quote: PairToken,
    /// Bin step of the new pair
    pub bin_step: u16,
    /// Initial price
    pub rate_price: f64,
    /// Fee payer and signer
    pub payer: String,
}

/// Pair creation response
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPair {
    /// Address of the pair the transaction creates
    pub pair_address: String,
    /// Unsigned transaction
    pub transaction: UnsignedTransaction,
}

/// A liquidity position owned by the user in one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInfo {
    /// Position NFT mint
    pub position_mint: String,
    /// Position account
    #[serde(default)]
    pub position: Option<String>,
    /// Lowest bin of the range
    #[serde(default)]
    pub lower_bin_id: i32,
    /// Highest bin of the range
    #[serde(default)]
    pub upper_bin_id: i32,
}

/// Base64 wire encoding of an unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnsignedTransaction(String);

impl UnsignedTransaction {
    /// Wrap a base64 string
    pub fn new<S: Into<String>>(encoded: S) -> Self {
        Self(encoded.into())
    }

    /// Base64 form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode a transaction
    pub fn encode(transaction: &Transaction) -> AppResult<Self> {
        let bytes = bincode::serde::encode_to_vec(transaction, bincode::config::legacy())
            .map_err(|e| AppError::internal(format!("Failed to encode transaction: {e}")))?;
        Ok(Self(BASE64.encode(bytes)))
    }

    /// Decode into a transaction ready for signing
    pub fn decode(&self) -> AppResult<Transaction> {
        let bytes = BASE64
            .decode(self.0.trim())
            .map_err(|e| AppError::upstream(LIQUIDITY_BOOK, format!("Transaction is not base64: {e}")))?;
        let (transaction, _) =
            bincode::serde::decode_from_slice::<Transaction, _>(&bytes, bincode::config::legacy())
                .map_err(|e| AppError::upstream(LIQUIDITY_BOOK, format!("Malformed transaction: {e}")))?;
        Ok(transaction)
    }
}

/// Pull a pair address out of whatever shape the SDK returned
///
/// Accepts a bare string or an object carrying the address under
/// `address`, `publicKey`, `pubkey`, `id` or `mint` (one level of nesting
/// is followed, for `{ "address": { "address": ".." } }`).
pub fn extract_pair_address(value: &Value) -> AppResult<String> {
    const KEYS: [&str; 5] = ["address", "publicKey", "pubkey", "id", "mint"];

    fn pick(value: &Value, depth: u8) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) if depth < 2 => KEYS
                .iter()
                .filter_map(|k| map.get(*k))
                .find_map(|v| pick(v, depth + 1)),
            _ => None,
        }
    }

    pick(value, 0).ok_or_else(|| {
        AppError::upstream(LIQUIDITY_BOOK, "Pair creation response carries no pair address")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_metadata_accepts_string_and_numeric_reserves() {
        let meta: PoolMetadata = serde_json::from_value(json!({
            "poolAddress": "pool1",
            "baseMint": "base",
            "quoteMint": "quote",
            "baseReserve": "1500000000",
            "quoteReserve": 250000000,
            "tradeFee": "0.25",
            "extra": { "tokenBaseDecimal": 9 }
        }))
        .unwrap();

        assert_eq!(meta.base_reserve, 1_500_000_000);
        assert_eq!(meta.quote_reserve, 250_000_000);
        assert_eq!(meta.trade_fee, 0.25);
        assert_eq!(meta.extra.token_base_decimal, Some(9));
        assert_eq!(meta.extra.token_quote_decimal, None);
        assert!(meta.matches("quote", "base"));
        assert!(!meta.matches("base", "other"));
    }

    #[test]
    fn test_metadata_without_reserves() {
        let meta: PoolMetadata =
            serde_json::from_value(json!({ "baseMint": "a", "quoteMint": "b" })).unwrap();
        assert_eq!(meta.base_reserve, 0);
        assert_eq!(meta.extra, PoolExtra::default());
    }

    #[test]
    fn test_quote_request_wire_shape() {
        let request = QuoteRequest {
            pair: "pool1".into(),
            token_base: "base".into(),
            token_quote: "quote".into(),
            amount: 10_000_000,
            swap_for_y: true,
            is_exact_input: true,
            token_base_decimal: 9,
            token_quote_decimal: 6,
            slippage: 50,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "pair": "pool1",
                "tokenBase": "base",
                "tokenQuote": "quote",
                "amount": "10000000",
                "swapForY": true,
                "isExactInput": true,
                "tokenBaseDecimal": 9,
                "tokenQuoteDecimal": 6,
                "slippage": 50
            })
        );
    }

    #[test]
    fn test_extract_pair_address_shapes() {
        assert_eq!(extract_pair_address(&json!("Pair111")).unwrap(), "Pair111");
        assert_eq!(extract_pair_address(&json!({ "publicKey": "Pair222" })).unwrap(), "Pair222");
        assert_eq!(
            extract_pair_address(&json!({ "address": { "address": "Pair333" } })).unwrap(),
            "Pair333"
        );
        assert!(extract_pair_address(&json!({ "bump": 254 })).is_err());
        assert!(extract_pair_address(&json!(null)).is_err());
    }

    #[test]
    fn test_unsigned_transaction_decodes() {
        use solana_sdk::{message::Message, pubkey::Pubkey, system_instruction};

        let payer = Pubkey::new_unique();
        let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 5);
        let tx = Transaction::new_unsigned(Message::new(&[ix], Some(&payer)));

        let encoded = UnsignedTransaction::encode(&tx).unwrap();
        assert_eq!(encoded.decode().unwrap(), tx);
        assert!(UnsignedTransaction::new("not base64!").decode().is_err());
    }
}
