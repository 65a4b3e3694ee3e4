//! Conversation flow engines
//!
//! Each engine reads and writes [`ConversationEntry`]s through the services'
//! conversation store and answers through a [`ReplySink`]. Engines never
//! talk to Telegram directly, and every error they can recover from is
//! turned into a reply here rather than bubbling up to the dispatcher.
//!
//! [`ConversationEntry`]: crate::core::types::ConversationEntry

pub mod pair;
pub mod pool;
pub mod swap;
pub mod wallet;

use async_trait::async_trait;
use solana_sdk::signature::Signature;
use tracing::{info, warn};

use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::core::types::UserIdentity;
use crate::services::saros::UnsignedTransaction;
use crate::services::ServiceContainer;

/// Callback actions carried by inline buttons
pub mod actions {
    /// Show the wallet
    pub const WALLET_VIEW: &str = "WALLET_VIEW";
    /// List pools
    pub const GET_ALL_POOLS: &str = "GET_ALL_POOLS";
    /// Ask for a pool address
    pub const GET_POOL_DETAILS: &str = "GET_POOL_DETAILS";
    /// Start pair creation
    pub const CREATE_POOL: &str = "create_pool";
    /// Start a swap
    pub const SWAP_START: &str = "SWAP_START";
    /// Show liquidity positions
    pub const VIEW_POSITIONS: &str = "VIEW_POSITIONS";
    /// Execute the quoted swap
    pub const SWAP_CONFIRM: &str = "SWAP_CONFIRM";
    /// Drop the quoted swap
    pub const SWAP_CANCEL: &str = "SWAP_CANCEL";
    /// Prefix of base token choices, followed by a registry id
    pub const BASE_PREFIX: &str = "base_";
    /// Prefix of quote token choices, followed by a registry id
    pub const QUOTE_PREFIX: &str = "quote_";
}

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Button label
    pub label: String,
    /// Callback action
    pub action: String,
}

impl Choice {
    /// Create a button
    pub fn new<L: Into<String>, A: Into<String>>(label: L, action: A) -> Self {
        Self { label: label.into(), action: action.into() }
    }
}

/// Outbound message with optional rows of buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message text
    pub text: String,
    /// Button rows
    pub choices: Vec<Vec<Choice>>,
}

impl Reply {
    /// Plain text message
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self { text: text.into(), choices: Vec::new() }
    }

    /// Attach button rows
    #[must_use]
    pub fn with_choices(mut self, choices: Vec<Vec<Choice>>) -> Self {
        self.choices = choices;
        self
    }
}

/// Outbound side of the transport, bound to one chat
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver a reply
    async fn send(&self, reply: Reply) -> AppResult<()>;
}

/// Main menu buttons
pub fn main_menu() -> Vec<Vec<Choice>> {
    vec![
        vec![
            Choice::new("💰 View wallet", actions::WALLET_VIEW),
            Choice::new("🔁 Swap", actions::SWAP_START),
        ],
        vec![
            Choice::new("📚 Pools", actions::GET_ALL_POOLS),
            Choice::new("🔍 Pool Details", actions::GET_POOL_DETAILS),
        ],
        vec![
            Choice::new("➕ Create New Pool", actions::CREATE_POOL),
            Choice::new("📊 Positions", actions::VIEW_POSITIONS),
        ],
    ]
}

/// Decode, sign inside the custody scope and submit a transaction built by the SDK
pub(crate) async fn sign_and_submit(
    services: &ServiceContainer,
    identity: &UserIdentity,
    password: &str,
    unsigned: &UnsignedTransaction,
) -> AppResult<Signature> {
    let mut transaction = unsigned.decode()?;
    let blockhash = services.ledger.latest_blockhash().await?;

    services
        .custody
        .with_keypair(identity, password, |keypair| {
            transaction.try_sign(&[keypair], blockhash).map_err(|e| {
                AppError::upstream("liquidity-book", format!("Transaction cannot be signed by this wallet: {e}"))
            })
        })
        .await?;

    let signature = services.ledger.send_and_confirm(&transaction).await?;
    info!("✅ Submitted transaction {} for {}", signature, identity);
    Ok(signature)
}

/// Report `error` and end the caller's flow unless the error is retryable
pub(crate) async fn end_flow(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    prefix: &str,
    error: &AppError,
) -> AppResult<()> {
    if !error.keeps_state() {
        services.conversations.clear(identity).await?;
    }
    warn!("Flow for {} ended: {}", identity, error);
    sink.send(Reply::text(format!("{prefix}{}", error.user_message()))).await
}
