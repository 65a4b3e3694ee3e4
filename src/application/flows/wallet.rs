//! Wallet bootstrap and wallet view

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::{main_menu, Reply, ReplySink};
use crate::core::result::AppResult;
use crate::core::types::{ConversationEntry, FlowStep, UserIdentity};
use crate::core::validation::validate_password;
use crate::services::ServiceContainer;

const PROMPT_PASSWORD: &str =
    "Enter a password to create a wallet. It encrypts your key and cannot be recovered if lost.";

/// `/start`: show the wallet, or begin creating one
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn start(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    if services.custody.has_wallet(identity).await? {
        let public_key = services.custody.public_key(identity).await?;
        return sink
            .send(Reply::text(format!("You already have a wallet: {public_key}")).with_choices(main_menu()))
            .await;
    }

    services
        .conversations
        .set(identity, ConversationEntry::new(FlowStep::AwaitingWalletPassword))
        .await?;
    sink.send(Reply::text(PROMPT_PASSWORD)).await
}

/// The text answering [`FlowStep::AwaitingWalletPassword`]
#[instrument(skip(services, sink, password), fields(identity = %identity))]
pub async fn handle_password(
    services: &ServiceContainer,
    identity: &UserIdentity,
    sink: &dyn ReplySink,
    password: &str,
) -> AppResult<()> {
    if let Err(e) = validate_password(password) {
        return sink.send(Reply::text(e.user_message())).await;
    }

    let outcome = services.custody.create_wallet(identity, password).await;
    services.conversations.clear(identity).await?;

    match outcome {
        Ok(record) => {
            info!("👛 Wallet ready for {}", identity);
            sink.send(
                Reply::text(format!(
                    "✅ Wallet created!\nAddress: {}\n\nKeep your password safe, it is needed to sign every transaction.",
                    record.public_key
                ))
                .with_choices(main_menu()),
            )
            .await
        }
        Err(e) => {
            warn!("Wallet creation failed: {}", e);
            sink.send(Reply::text(format!("❌ Failed to create wallet: {}", e.user_message()))).await
        }
    }
}

fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(lamports), 9).normalize()
}

/// Public key and SOL balance
#[instrument(skip(services, sink), fields(identity = %identity))]
pub async fn view(services: &ServiceContainer, identity: &UserIdentity, sink: &dyn ReplySink) -> AppResult<()> {
    let public_key = match services.custody.public_key(identity).await {
        Ok(public_key) => public_key,
        Err(e) => return sink.send(Reply::text(e.user_message())).await,
    };

    let balance = match services.ledger.balance(&public_key).await {
        Ok(lamports) => format!("{} SOL", lamports_to_sol(lamports)),
        Err(e) => {
            warn!("Balance lookup failed: {}", e);
            "unavailable".to_string()
        }
    };

    sink.send(
        Reply::text(format!("💰 Wallet\nAddress: {public_key}\nBalance: {balance}")).with_choices(main_menu()),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flows::testing::{services, services_with_wallet, RecordingSink, PASSWORD};
    use crate::core::error::AppError;
    use crate::services::saros::MockLiquidityBook;
    use crate::services::solana::MockLedgerClient;

    #[tokio::test]
    async fn test_bootstrap_creates_wallet() {
        let identity = UserIdentity::new("5");
        let services = services(MockLiquidityBook::new(), MockLedgerClient::new());
        let sink = RecordingSink::default();

        start(&services, &identity, &sink).await.unwrap();
        let entry = services.conversations.get(&identity).await.unwrap().unwrap();
        assert_eq!(entry.step, FlowStep::AwaitingWalletPassword);

        handle_password(&services, &identity, &sink, "short").await.unwrap();
        assert_eq!(sink.last().text, "Password must be at least 8 characters. Try again.");
        assert!(services.conversations.get(&identity).await.unwrap().is_some());

        handle_password(&services, &identity, &sink, PASSWORD).await.unwrap();
        assert!(services.conversations.get(&identity).await.unwrap().is_none());
        assert!(services.custody.has_wallet(&identity).await.unwrap());
        assert!(sink.last().text.starts_with("✅ Wallet created!"));
    }

    #[tokio::test]
    async fn test_start_with_existing_wallet() {
        let identity = UserIdentity::new("5");
        let services = services_with_wallet(MockLiquidityBook::new(), MockLedgerClient::new(), &identity).await;
        let sink = RecordingSink::default();

        start(&services, &identity, &sink).await.unwrap();

        let public_key = services.custody.public_key(&identity).await.unwrap();
        let reply = sink.last();
        assert_eq!(reply.text, format!("You already have a wallet: {public_key}"));
        assert_eq!(reply.choices, main_menu());
        assert!(services.conversations.get(&identity).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_view_shows_balance_best_effort() {
        let identity = UserIdentity::new("5");
        let mut ledger = MockLedgerClient::new();
        ledger
            .expect_balance()
            .times(1)
            .returning(|_| Ok(1_500_000_000));
        ledger
            .expect_balance()
            .returning(|_| Err(AppError::upstream("solana-rpc", "timeout")));
        let services = services_with_wallet(MockLiquidityBook::new(), ledger, &identity).await;
        let sink = RecordingSink::default();

        view(&services, &identity, &sink).await.unwrap();
        assert!(sink.last().text.ends_with("Balance: 1.5 SOL"));

        view(&services, &identity, &sink).await.unwrap();
        assert!(sink.last().text.ends_with("Balance: unavailable"));
    }

    #[tokio::test]
    async fn test_view_without_wallet() {
        let services = services(MockLiquidityBook::new(), MockLedgerClient::new());
        let sink = RecordingSink::default();

        view(&services, &UserIdentity::new("5"), &sink).await.unwrap();

        assert_eq!(sink.last().text, "No wallet found. Use /start to create a wallet first.");
    }
}
