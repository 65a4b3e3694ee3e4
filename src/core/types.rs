//! Core type definitions and value objects for the domain model
//!
//! Strongly-typed wrappers and records shared by the flow engines, the
//! custody layer and the persistence adapters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable platform-assigned identity of a bot user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    /// Wrap a raw identity string
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Get the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for UserIdentity {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted custody record, one per identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Owner of the wallet
    pub identity: UserIdentity,
    /// Base58 public key, immutable once created
    pub public_key: String,
    /// Base64 `salt ‖ nonce ‖ tag ‖ ciphertext` of the 64-byte secret key
    pub encrypted_secret: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Which engine owns a conversation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Wallet bootstrap
    Wallet,
    /// Token swap
    Swap,
    /// Liquidity pair creation
    Pair,
}

/// Current step of a multi-message flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStep {
    /// Next text is the password for a new wallet
    AwaitingWalletPassword,
    /// Next text is the token to sell
    AwaitingInputToken,
    /// Next text is the amount to sell
    AwaitingAmount,
    /// Next text is the token to buy
    AwaitingOutputToken,
    /// Quote presented, waiting for confirm/cancel
    AwaitingConfirm,
    /// Next text is the password that unlocks the swap signer
    AwaitingSwapPassword,
    /// Base token picked, waiting for the quote token
    SelectingPairQuote,
    /// Next text is the password that unlocks the pair creation signer
    AwaitingPairPassword,
}

impl FlowStep {
    /// Engine responsible for this step
    pub fn flow(self) -> FlowKind {
        match self {
            Self::AwaitingWalletPassword => FlowKind::Wallet,
            Self::AwaitingInputToken
            | Self::AwaitingAmount
            | Self::AwaitingOutputToken
            | Self::AwaitingConfirm
            | Self::AwaitingSwapPassword => FlowKind::Swap,
            Self::SelectingPairQuote | Self::AwaitingPairPassword => FlowKind::Pair,
        }
    }

    /// Whether the message answering this step carries a password
    pub fn expects_secret(self) -> bool {
        matches!(
            self,
            Self::AwaitingWalletPassword | Self::AwaitingSwapPassword | Self::AwaitingPairPassword
        )
    }

    /// Wire tag of the step
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingWalletPassword => "AWAITING_WALLET_PASSWORD",
            Self::AwaitingInputToken => "AWAITING_INPUT_TOKEN",
            Self::AwaitingAmount => "AWAITING_AMOUNT",
            Self::AwaitingOutputToken => "AWAITING_OUTPUT_TOKEN",
            Self::AwaitingConfirm => "AWAITING_CONFIRM",
            Self::AwaitingSwapPassword => "AWAITING_SWAP_PASSWORD",
            Self::SelectingPairQuote => "SELECTING_PAIR_QUOTE",
            Self::AwaitingPairPassword => "AWAITING_PAIR_PASSWORD",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a quote was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteSource {
    /// Returned by the SDK quote route with this name
    Sdk {
        /// Route that answered
        method: String,
    },
    /// Constant-product approximation over reported reserves
    ConstantProductEstimate,
}

/// Swap quote held between the quote and the confirmation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Pool (pair) address
    pub pool: String,
    /// Base mint of the pool
    pub token_base: String,
    /// Quote mint of the pool
    pub token_quote: String,
    /// Amount the user sells, in whole tokens
    pub amount: Decimal,
    /// Amount the user sells, in minor units
    pub amount_raw: u64,
    /// Estimated output, in whole tokens
    pub output_amount: Decimal,
    /// Estimated output, in minor units
    pub output_raw: u64,
    /// Price impact reported by the SDK
    pub price_impact: f64,
    /// Fees reported by the SDK
    pub fees: f64,
    /// Decimals of the base mint
    pub token_base_decimal: u8,
    /// Decimals of the quote mint
    pub token_quote_decimal: u8,
    /// True when selling the base mint for the quote mint
    pub swap_for_y: bool,
    /// Exact-input swap
    pub is_exact_input: bool,
    /// Transfer hook program of the pool, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    /// Where the figures come from
    pub source: QuoteSource,
}

impl SwapQuote {
    /// True when the figures are a local approximation rather than an SDK quote
    pub fn is_estimate(&self) -> bool {
        matches!(self.source, QuoteSource::ConstantProductEstimate)
    }
}

/// Pair creation in progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDraft {
    /// Registry id of the base token
    pub base: String,
    /// Registry id of the quote token
    pub quote: Option<String>,
    /// Address of the pair the SDK will create
    pub pair_address: Option<String>,
    /// Unsigned create-pair transaction, base64 of its wire encoding
    pub transaction: Option<String>,
}

/// Step-scoped data, appended field by field as the flow advances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowPayload {
    /// Token to sell, symbol or mint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token: Option<String>,
    /// Amount to sell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Token to buy, symbol or mint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_token: Option<String>,
    /// Quote awaiting confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<SwapQuote>,
    /// Pair creation draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<PairDraft>,
}

/// Conversation state of one identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Current step
    pub step: FlowStep,
    /// Data collected so far
    #[serde(default)]
    pub payload: FlowPayload,
}

impl ConversationEntry {
    /// Fresh entry at `step` with an empty payload
    pub fn new(step: FlowStep) -> Self {
        Self {
            step,
            payload: FlowPayload::default(),
        }
    }

    /// Same payload, next step
    #[must_use]
    pub fn advance(mut self, step: FlowStep) -> Self {
        self.step = step;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_telegram_id() {
        let identity = UserIdentity::from(123_456_789_u64);
        assert_eq!(identity.as_str(), "123456789");
        assert_eq!(identity.to_string(), "123456789");
    }

    #[test]
    fn test_step_ownership() {
        assert_eq!(FlowStep::AwaitingAmount.flow(), FlowKind::Swap);
        assert_eq!(FlowStep::AwaitingWalletPassword.flow(), FlowKind::Wallet);
        assert_eq!(FlowStep::SelectingPairQuote.flow(), FlowKind::Pair);
        assert!(FlowStep::AwaitingSwapPassword.expects_secret());
        assert!(!FlowStep::AwaitingOutputToken.expects_secret());
    }

    #[test]
    fn test_entry_serializes_step_tag() {
        let mut entry = ConversationEntry::new(FlowStep::AwaitingAmount);
        entry.payload.input_token = Some("SOL".to_string());

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["step"], "AWAITING_AMOUNT");
        assert_eq!(json["payload"]["input_token"], "SOL");
        assert!(json["payload"].get("quote").is_none());

        let back: ConversationEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
