//! Swap flow
//!
//! ```text
//! /swap -> AWAITING_INPUT_TOKEN -> AWAITING_AMOUNT -> AWAITING_OUTPUT_TOKEN
//!       -> (quote) AWAITING_CONFIRM -> (confirm) AWAITING_SWAP_PASSWORD -> done
//! ```
//!
//! Only an invalid amount or blank text is retried in place. A failed quote,
//! including an amount below the token's smallest unit, a cancel, or any
//! execution failure ends the flow.
//!
//! The password is used exactly as typed; only the blank check trims.

use tracing::{debug, instrument};

use super::{actions, end_flow, sign_and_submit, Choice, Reply, ReplySink};
use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::core::types::{ConversationEntry, FlowKind, FlowStep, SwapQuote, UserIdentity};
use crate::core::validation::parse_amount;
use crate::services::ServiceContainer;

const PROMPT_INPUT: &str = "Which token do you want to sell? (mint or symbol like SOL)";
const PROMPT_AMOUNT: &str = "How much do you want to sell? (e.g., 0.01)";
const PROMPT_OUTPUT: &str = "Which token do you want to buy? (mint or symbol)";
const PROMPT_CONFIRM: &str = "Use the buttons above to confirm or cancel the swap.";
const PROMPT_PASSWORD: &str = "Enter your wallet password to sign the swap.";

fn confirm_choices() -> Vec<Vec<Choice>> {
    vec![vec![
        Choice::new("✅ Confirm Swap", actions::SWAP_CONFIRM),
        Choice::new("❌ Cancel", actions::SWAP_CANCEL),
    ]]
}

/// Quote summary shown before confirmation
pub fn quote_summary(input: &str, output: &str, quote: &SwapQuote) -> String {
    let mut text = format!(
        "Sell: {} {}\nReceive (est): ~{} {}\nPrice impact: {:.4}%\nFees: {}",
        quote.amount, input, quote.output_amount, output, quote.price_impact, quote.fees
    );
    if quote.is_estimate() {
        text.push_str("\n\n⚠️ Approximation from pool reserves, the SDK returned no quote.");
    }
    text
}

/// Enter the swap flow
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn start(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    if !services.custody.has_wallet(identity).await? {
        return sink.send(Reply::text("No wallet found. Use /start.")).await;
    }

    services
        .conversations
        .set(identity, ConversationEntry::new(FlowStep::AwaitingInputToken))
        .await?;
    sink.send(Reply::text(PROMPT_INPUT)).await
}

/// Prompt for the current step, used when the text does not advance it
async fn reprompt(entry: &ConversationEntry, sink: &dyn ReplySink) -> AppResult<()> {
    let reply = match entry.step {
        FlowStep::AwaitingInputToken => Reply::text(PROMPT_INPUT),
        FlowStep::AwaitingAmount => Reply::text(PROMPT_AMOUNT),
        FlowStep::AwaitingOutputToken => Reply::text(PROMPT_OUTPUT),
        FlowStep::AwaitingSwapPassword => Reply::text(PROMPT_PASSWORD),
        _ => Reply::text(PROMPT_CONFIRM).with_choices(confirm_choices()),
    };
    sink.send(reply).await
}

/// Advance the swap flow with a text message
#[instrument(skip(services, sink, entry, text), fields(identity = %identity, step = %entry.step))]
pub async fn handle_text(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    entry: ConversationEntry,
    text: &str,
) -> AppResult<()> {
    let password = text;
    let text = text.trim();
    if text.is_empty() {
        return reprompt(&entry, sink).await;
    }

    match entry.step {
        FlowStep::AwaitingInputToken => {
            let mut next = entry.advance(FlowStep::AwaitingAmount);
            next.payload.input_token = Some(text.to_string());
            services.conversations.set(identity, next).await?;
            sink.send(Reply::text(PROMPT_AMOUNT)).await
        }
        FlowStep::AwaitingAmount => match parse_amount(text) {
            Ok(amount) => {
                let mut next = entry.advance(FlowStep::AwaitingOutputToken);
                next.payload.amount = Some(amount);
                services.conversations.set(identity, next).await?;
                sink.send(Reply::text(PROMPT_OUTPUT)).await
            }
            Err(e) => {
                debug!("Rejected amount: {}", e);
                sink.send(Reply::text(e.user_message())).await
            }
        },
        FlowStep::AwaitingOutputToken => request_quote(services, identity, sink, entry, text).await,
        FlowStep::AwaitingSwapPassword => execute(services, identity, sink, entry, password).await,
        _ => reprompt(&entry, sink).await,
    }
}

async fn request_quote(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    entry: ConversationEntry,
    output_token: &str,
) -> AppResult<()> {
    let (Some(input_token), Some(amount)) = (entry.payload.input_token.clone(), entry.payload.amount) else {
        let error = AppError::internal("Swap state lost its input token or amount");
        return end_flow(services, identity, sink, "Failed to fetch quote: ", &error).await;
    };

    sink.send(Reply::text("Fetching quote...")).await?;

    match services.quotes.quote(&input_token, output_token, amount).await {
        Ok(quote) => {
            let summary = quote_summary(&input_token, output_token, &quote);
            let mut next = entry.advance(FlowStep::AwaitingConfirm);
            next.payload.output_token = Some(output_token.to_string());
            next.payload.quote = Some(quote);
            services.conversations.set(identity, next).await?;
            sink.send(Reply::text(summary).with_choices(confirm_choices())).await
        }
        Err(e) => {
            services.conversations.clear(identity).await?;
            sink.send(Reply::text(format!("Failed to fetch quote: {}", e.user_message()))).await
        }
    }
}

/// Confirm button: ask for the password that unlocks the signer
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn confirm(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    match services.conversations.get(identity).await? {
        Some(entry) if entry.step == FlowStep::AwaitingConfirm && entry.payload.quote.is_some() => {
            services
                .conversations
                .set(identity, entry.advance(FlowStep::AwaitingSwapPassword))
                .await?;
            sink.send(Reply::text(PROMPT_PASSWORD)).await
        }
        _ => sink.send(Reply::text("No swap waiting for confirmation. Use /swap to start.")).await,
    }
}

/// Cancel button: drop the swap whatever step it is at
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn cancel(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    if let Some(entry) = services.conversations.get(identity).await? {
        if entry.step.flow() == FlowKind::Swap {
            services.conversations.clear(identity).await?;
        }
    }
    sink.send(Reply::text("Swap cancelled.")).await
}

async fn execute(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    entry: ConversationEntry,
    password: &str,
) -> AppResult<()> {
    let Some(quote) = entry.payload.quote else {
        let error = AppError::internal("Swap state lost its quote");
        return end_flow(services, identity, sink, "❌ Swap failed: ", &error).await;
    };

    let outcome = async {
        let payer = services.custody.public_key(identity).await?;
        let request = services.quotes.swap_request(&quote, &payer.to_string());
        let unsigned = services.book.build_swap_transaction(&request).await?;
        sign_and_submit(services, identity, password, &unsigned).await
    }
    .await;

    match outcome {
        Ok(signature) => {
            services.conversations.clear(identity).await?;
            sink.send(Reply::text(format!("✅ Swap submitted!\nSignature: {signature}"))).await
        }
        Err(e) => {
            // a wrong password ends the flow too; the quote is stale by now anyway
            services.conversations.clear(identity).await?;
            sink.send(Reply::text(format!("❌ Swap failed: {}", e.user_message()))).await
        }
    }
}
