//! Pair creation
//!
//! The base token arrives through a `base_{id}` button, which moves the
//! identity to [`FlowStep::SelectingPairQuote`]. The quote token arrives
//! through a `quote_{id}` button; the SDK then builds the transaction and
//! the flow waits for the password that signs it.

use tracing::{info, instrument};

use super::{actions, sign_and_submit, Choice, Reply, ReplySink};
use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::core::types::{ConversationEntry, FlowStep, PairDraft, UserIdentity};
use crate::services::saros::tokens::{self, TokenInfo, TOKENS};
use crate::services::saros::types::{CreatePairRequest, PairToken};
use crate::services::saros::UnsignedTransaction;
use crate::services::ServiceContainer;

const PROMPT_BASE: &str = "Pick your base token:";
const PROMPT_QUOTE: &str = "Pick your quote token:";
const PROMPT_PASSWORD: &str = "Enter your wallet password to sign and create the pool.";
const RESTART: &str = "Start again with ➕ Create New Pool.";

fn token_choices(prefix: &str, exclude: Option<&str>) -> Vec<Vec<Choice>> {
    TOKENS
        .iter()
        .filter(|t| Some(t.id) != exclude)
        .map(|t| Choice::new(t.symbol, format!("{prefix}{}", t.id)))
        .collect::<Vec<_>>()
        .chunks(2)
        .map(<[Choice]>::to_vec)
        .collect()
}

fn pair_token(token: &TokenInfo) -> PairToken {
    PairToken {
        mint_address: token.mint.to_string(),
        decimal: token.decimals,
    }
}

fn unknown_token(id: &str) -> AppError {
    AppError::validation(format!("Unknown token: {id}")).with_field("token")
}

/// Offer the base tokens
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn start(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    if !services.custody.has_wallet(identity).await? {
        return sink.send(Reply::text("No wallet found. Use /start.")).await;
    }
    sink.send(Reply::text(PROMPT_BASE).with_choices(token_choices(actions::BASE_PREFIX, None)))
        .await
}

/// `base_{id}` button
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn select_base(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    id: &str,
) -> AppResult<()> {
    let Some(base) = tokens::by_id(id) else {
        return sink.send(Reply::text(unknown_token(id).user_message())).await;
    };

    let mut entry = ConversationEntry::new(FlowStep::SelectingPairQuote);
    entry.payload.pair = Some(PairDraft {
        base: base.id.to_string(),
        ..PairDraft::default()
    });
    services.conversations.set(identity, entry).await?;

    sink.send(Reply::text(PROMPT_QUOTE).with_choices(token_choices(actions::QUOTE_PREFIX, Some(base.id))))
        .await
}

/// `quote_{id}` button: have the SDK build the pair
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn select_quote(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    id: &str,
) -> AppResult<()> {
    let draft = match services.conversations.get(identity).await? {
        Some(ConversationEntry { step: FlowStep::SelectingPairQuote, payload }) => payload.pair,
        _ => None,
    };
    let Some(draft) = draft else {
        return sink.send(Reply::text(RESTART)).await;
    };

    let (Some(base), Some(quote)) = (tokens::by_id(&draft.base), tokens::by_id(id)) else {
        return sink.send(Reply::text(unknown_token(id).user_message())).await;
    };
    if base.id == quote.id {
        return sink.send(Reply::text("Base and quote tokens must differ.")).await;
    }

    let built = async {
        let payer = services.custody.public_key(identity).await?;
        let request = CreatePairRequest {
            token_base: pair_token(base),
            token_quote: pair_token(quote),
            bin_step: services.settings.default_bin_step,
            rate_price: services.settings.default_rate_price,
            payer: payer.to_string(),
        };
        services.book.create_pair(&request).await
    }
    .await;

    match built {
        Ok(created) => {
            let mut entry = ConversationEntry::new(FlowStep::AwaitingPairPassword);
            entry.payload.pair = Some(PairDraft {
                base: base.id.to_string(),
                quote: Some(quote.id.to_string()),
                pair_address: Some(created.pair_address.clone()),
                transaction: Some(created.transaction.as_str().to_string()),
            });
            services.conversations.set(identity, entry).await?;

            sink.send(Reply::text(format!(
                "Pool {}/{} ready at {}.\n{PROMPT_PASSWORD}",
                base.symbol, quote.symbol, created.pair_address
            )))
            .await
        }
        Err(e) => {
            services.conversations.clear(identity).await?;
            sink.send(Reply::text(format!("❌ Failed to create pool: {}", e.user_message()))).await
        }
    }
}

/// Text while a pair creation is in progress
#[instrument(skip(services, sink, entry, text), fields(identity = %identity, step = %entry.step))]
pub async fn handle_text(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    entry: ConversationEntry,
    text: &str,
) -> AppResult<()> {
    let draft = entry.payload.pair.clone().unwrap_or_default();

    match entry.step {
        FlowStep::AwaitingPairPassword if !text.trim().is_empty() => {
            submit(services, identity, sink, draft, text).await
        }
        FlowStep::AwaitingPairPassword => sink.send(Reply::text(PROMPT_PASSWORD)).await,
        _ => {
            let exclude = tokens::by_id(&draft.base).map(|t| t.id);
            sink.send(Reply::text(PROMPT_QUOTE).with_choices(token_choices(actions::QUOTE_PREFIX, exclude)))
                .await
        }
    }
}

async fn submit(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    draft: PairDraft,
    password: &str,
) -> AppResult<()> {
    let outcome = async {
        let (Some(pair_address), Some(transaction)) = (draft.pair_address.as_deref(), draft.transaction.as_deref())
        else {
            return Err(AppError::internal("Pair draft lost its transaction"));
        };
        let signature = sign_and_submit(services, identity, password, &UnsignedTransaction::new(transaction)).await?;
        Ok((pair_address.to_string(), signature))
    }
    .await;

    services.conversations.clear(identity).await?;

    let label = |id: Option<&str>| {
        id.and_then(tokens::by_id)
            .map_or_else(|| id.unwrap_or_default().to_string(), |t| t.symbol.to_string())
    };

    match outcome {
        Ok((pair_address, signature)) => {
            info!("🆕 Pool {} created for {}", pair_address, identity);
            sink.send(Reply::text(format!(
                "✅ Pool created!\nBase: {}\nQuote: {}\nPair Address: {}\nSignature: {}",
                label(Some(draft.base.as_str())),
                label(draft.quote.as_deref()),
                pair_address,
                signature
            )))
            .await
        }
        Err(e) => sink.send(Reply::text(format!("❌ Failed to create pool: {}", e.user_message()))).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flows::testing::{services_with_wallet, RecordingSink, PASSWORD};
    use crate::services::saros::{CreatedPair, MockLiquidityBook};
    use crate::services::solana::MockLedgerClient;
    use solana_sdk::hash::Hash;
    use solana_sdk::message::Message;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Signature;
    use solana_sdk::system_instruction;
    use solana_sdk::transaction::Transaction;
    use std::str::FromStr;

    fn pair_book() -> MockLiquidityBook {
        let mut book = MockLiquidityBook::new();
        book.expect_create_pair()
            .withf(|r| r.bin_step == 20 && r.token_base.decimal == 9 && r.token_quote.decimal == 6)
            .returning(|request| {
                let payer = Pubkey::from_str(&request.payer).unwrap();
                let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 1);
                Ok(CreatedPair {
                    pair_address: "NewPair1111".into(),
                    transaction: UnsignedTransaction::encode(&Transaction::new_unsigned(Message::new(
                        &[ix],
                        Some(&payer),
                    )))?,
                })
            });
        book
    }

    #[tokio::test]
    async fn test_pair_creation_flow() {
        let identity = UserIdentity::new("9");
        let signature = Signature::new_unique();
        let mut ledger = MockLedgerClient::new();
        ledger.expect_latest_blockhash().returning(|| Ok(Hash::new_unique()));
        ledger.expect_send_and_confirm().returning(move |_| Ok(signature));
        let services = services_with_wallet(pair_book(), ledger, &identity).await;
        let sink = RecordingSink::default();

        start(&services, &identity, &sink).await.unwrap();
        let base_buttons = sink.last().choices.concat();
        assert!(base_buttons.iter().any(|c| c.action == "base_wsol"));

        select_base(&services, &identity, &sink, "wsol").await.unwrap();
        let quote_buttons = sink.last().choices.concat();
        assert_eq!(sink.last().text, PROMPT_QUOTE);
        assert!(quote_buttons.iter().all(|c| c.action != "quote_wsol"));

        select_quote(&services, &identity, &sink, "usdc").await.unwrap();
        let entry = services.conversations.get(&identity).await.unwrap().unwrap();
        assert_eq!(entry.step, FlowStep::AwaitingPairPassword);

        handle_text(&services, &identity, &sink, entry, PASSWORD).await.unwrap();

        assert!(services.conversations.get(&identity).await.unwrap().is_none());
        assert_eq!(
            sink.last().text,
            format!("✅ Pool created!\nBase: WSOL\nQuote: USDC\nPair Address: NewPair1111\nSignature: {signature}")
        );
    }

    #[tokio::test]
    async fn test_quote_without_base_restarts() {
        let identity = UserIdentity::new("9");
        let services = services_with_wallet(MockLiquidityBook::new(), MockLedgerClient::new(), &identity).await;
        let sink = RecordingSink::default();

        select_quote(&services, &identity, &sink, "usdc").await.unwrap();

        assert_eq!(sink.last().text, RESTART);
    }

    #[tokio::test]
    async fn test_sdk_failure_clears_state() {
        let identity = UserIdentity::new("9");
        let mut book = MockLiquidityBook::new();
        book.expect_create_pair()
            .returning(|_| Err(AppError::upstream("liquidity-book", "pair already exists")));
        let services = services_with_wallet(book, MockLedgerClient::new(), &identity).await;
        let sink = RecordingSink::default();

        select_base(&services, &identity, &sink, "pyusd").await.unwrap();
        select_quote(&services, &identity, &sink, "usdc").await.unwrap();

        assert!(services.conversations.get(&identity).await.unwrap().is_none());
        assert_eq!(sink.last().text, "❌ Failed to create pool: pair already exists");
    }
}
