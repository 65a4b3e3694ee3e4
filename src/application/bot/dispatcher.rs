//! Update routing
//!
//! [`Router`] is the transport-independent part: it serializes work per
//! identity, picks the flow that owns each update and turns anything that
//! escapes a flow (errors and panics alike) into a reply. [`schema`] wires
//! it into teloxide.

use futures::FutureExt;
use std::error::Error;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use super::commands::Command;
use super::sink::TelegramSink;
use crate::application::flows::{self, actions, main_menu, pair, pool, swap, wallet, Reply, ReplySink};
use crate::core::error::ErrorSeverity;
use crate::core::result::AppResult;
use crate::core::types::{FlowKind, UserIdentity};
use crate::services::{IdentityLocks, ServiceContainer};

/// Error type of the teloxide handlers
pub type HandlerError = Box<dyn Error + Send + Sync + 'static>;

/// Result of the teloxide handlers
pub type HandlerResult = Result<(), HandlerError>;

const FALLBACK_REPLY: &str = "Something went wrong. Please try again later.";

/// What the router did with a text message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextOutcome {
    /// The text answered a password prompt
    pub carried_secret: bool,
}

/// Routes commands, button presses and text to the flow engines
#[derive(Clone)]
pub struct Router {
    services: ServiceContainer,
    locks: IdentityLocks,
    delete_secrets: bool,
}

impl Router {
    /// Create a router over the services
    pub fn new(services: ServiceContainer, delete_secrets: bool) -> Self {
        Self {
            services,
            locks: IdentityLocks::new(),
            delete_secrets,
        }
    }

    /// Whether password messages should be removed from the chat
    pub fn deletes_secrets(&self) -> bool {
        self.delete_secrets
    }

    /// Run `work` for `identity` exclusively, reporting whatever escapes it
    async fn guarded<F>(&self, identity: &UserIdentity, sink: &dyn ReplySink, work: F)
    where
        F: Future<Output = AppResult<()>>,
    {
        let _guard = self.locks.acquire(identity).await;

        let reply = match AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => {
                match e.severity() {
                    ErrorSeverity::Low => debug!("Update for {} failed: {}", identity, e),
                    ErrorSeverity::Medium => warn!("Update for {} failed: {}", identity, e),
                    ErrorSeverity::High | ErrorSeverity::Critical => {
                        error!("Update for {} failed: {}", identity, e)
                    }
                }
                e.user_message()
            }
            Err(_) => {
                error!("💥 Handler panicked for {}", identity);
                if let Err(e) = self.services.conversations.clear(identity).await {
                    warn!("Could not reset state after panic: {}", e);
                }
                FALLBACK_REPLY.to_string()
            }
        };

        if let Err(e) = sink.send(Reply::text(reply)).await {
            warn!("Could not deliver error reply to {}: {}", identity, e);
        }
    }

    /// Handle a slash command
    pub async fn on_command(&self, identity: &UserIdentity, command: Command, sink: &dyn ReplySink) {
        let services = &self.services;
        self.guarded(identity, sink, async {
            match command {
                Command::Start => wallet::start(services, identity, sink).await,
                Command::Wallet => wallet::view(services, identity, sink).await,
                Command::Swap => swap::start(services, identity, sink).await,
                Command::Pools => pool::list_pools(services, sink).await,
                Command::Positions => pool::positions(services, identity, sink).await,
                Command::Cancel => {
                    services.conversations.clear(identity).await?;
                    services.conversations.take_pool_pending(identity).await?;
                    sink.send(Reply::text("Cancelled.").with_choices(main_menu())).await
                }
                Command::Help => sink.send(Reply::text(Command::descriptions().to_string())).await,
            }
        })
        .await;
    }

    /// Handle a button press
    pub async fn on_action(&self, identity: &UserIdentity, action: &str, sink: &dyn ReplySink) {
        let services = &self.services;
        self.guarded(identity, sink, async {
            if let Some(id) = action.strip_prefix(actions::BASE_PREFIX) {
                return pair::select_base(services, identity, sink, id).await;
            }
            if let Some(id) = action.strip_prefix(actions::QUOTE_PREFIX) {
                return pair::select_quote(services, identity, sink, id).await;
            }

            match action {
                actions::WALLET_VIEW => wallet::view(services, identity, sink).await,
                actions::GET_ALL_POOLS => pool::list_pools(services, sink).await,
                actions::GET_POOL_DETAILS => pool::request_details(services, identity, sink).await,
                actions::CREATE_POOL => pair::start(services, identity, sink).await,
                actions::SWAP_START => swap::start(services, identity, sink).await,
                actions::VIEW_POSITIONS => pool::positions(services, identity, sink).await,
                actions::SWAP_CONFIRM => swap::confirm(services, identity, sink).await,
                actions::SWAP_CANCEL => swap::cancel(services, identity, sink).await,
                other => {
                    warn!("Unknown action {:?}", other);
                    sink.send(Reply::text("Unknown action.")).await
                }
            }
        })
        .await;
    }

    /// Handle free text
    ///
    /// An in-progress step always owns the text; only without one is a
    /// pending pool-address request considered.
    pub async fn on_text(&self, identity: &UserIdentity, text: &str, sink: &dyn ReplySink) -> TextOutcome {
        let services = &self.services;
        let mut outcome = TextOutcome::default();
        let carried_secret = &mut outcome.carried_secret;

        self.guarded(identity, sink, async {
            if let Some(entry) = services.conversations.get(identity).await? {
                *carried_secret = entry.step.expects_secret();
                return match entry.step.flow() {
                    FlowKind::Wallet => wallet::handle_password(services, identity, sink, text).await,
                    FlowKind::Swap => swap::handle_text(services, identity, sink, entry, text).await,
                    FlowKind::Pair => pair::handle_text(services, identity, sink, entry, text).await,
                };
            }

            if services.conversations.take_pool_pending(identity).await? {
                return pool::handle_pending_text(services, identity, sink, text).await;
            }

            sink.send(Reply::text("Use the menu below or /help.").with_choices(flows::main_menu()))
                .await
        })
        .await;

        outcome
    }
}

/// Teloxide handler tree
pub fn schema() -> UpdateHandler<HandlerError> {
    let commands = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(command_handler);
    let messages = Update::filter_message().endpoint(message_handler);
    let callbacks = Update::filter_callback_query().endpoint(callback_handler);

    dptree::entry().branch(commands).branch(messages).branch(callbacks)
}

fn identity_of(msg: &Message) -> Option<UserIdentity> {
    msg.from.as_ref().map(|user| UserIdentity::from(user.id.0))
}

async fn command_handler(bot: Bot, msg: Message, command: Command, router: Arc<Router>) -> HandlerResult {
    let Some(identity) = identity_of(&msg) else {
        return Ok(());
    };
    info!("📨 /{:?} from {}", command, identity);

    let sink = TelegramSink::new(bot, msg.chat.id);
    router.on_command(&identity, command, &sink).await;
    Ok(())
}

async fn message_handler(bot: Bot, msg: Message, router: Arc<Router>) -> HandlerResult {
    let (Some(identity), Some(text)) = (identity_of(&msg), msg.text()) else {
        return Ok(());
    };

    let sink = TelegramSink::new(bot.clone(), msg.chat.id);
    let outcome = router.on_text(&identity, text, &sink).await;

    if outcome.carried_secret && router.deletes_secrets() {
        if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
            warn!("Could not delete password message of {}: {}", identity, e);
        }
    }
    Ok(())
}

async fn callback_handler(bot: Bot, query: CallbackQuery, router: Arc<Router>) -> HandlerResult {
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        debug!("Could not answer callback query: {}", e);
    }

    let Some(action) = query.data.as_deref() else {
        return Ok(());
    };
    let identity = UserIdentity::from(query.from.id.0);
    debug!("🔘 {} from {}", action, identity);

    let sink = TelegramSink::new(bot, ChatId::from(query.from.id));
    router.on_action(&identity, action, &sink).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flows::testing::{services, services_with_wallet, RecordingSink, PASSWORD};
    use crate::core::types::FlowStep;
    use crate::services::saros::MockLiquidityBook;
    use crate::services::solana::MockLedgerClient;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_step_takes_precedence_over_pending_pool_request() {
        let identity = UserIdentity::new("11");
        let services = services_with_wallet(MockLiquidityBook::new(), MockLedgerClient::new(), &identity).await;
        let router = Router::new(services.clone(), true);
        let sink = RecordingSink::default();

        router.on_action(&identity, actions::GET_POOL_DETAILS, &sink).await;
        router.on_command(&identity, Command::Swap, &sink).await;
        let outcome = router.on_text(&identity, "SOL", &sink).await;

        assert!(!outcome.carried_secret);
        let entry = services.conversations.get(&identity).await.unwrap().unwrap();
        assert_eq!(entry.step, FlowStep::AwaitingAmount);
        assert!(services.conversations.take_pool_pending(&identity).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_pool_request_gets_text_without_step() {
        let identity = UserIdentity::new("11");
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses().returning(|| Ok(vec![]));
        let services = services(book, MockLedgerClient::new());
        let router = Router::new(services.clone(), true);
        let sink = RecordingSink::default();

        router.on_action(&identity, actions::GET_POOL_DETAILS, &sink).await;
        router.on_text(&identity, " ", &sink).await;

        assert_eq!(sink.last().text, "No pools found.");
        assert!(!services.conversations.take_pool_pending(&identity).await.unwrap());
    }

    #[tokio::test]
    async fn test_password_text_is_flagged() {
        let identity = UserIdentity::new("11");
        let router = Router::new(services(MockLiquidityBook::new(), MockLedgerClient::new()), true);
        let sink = RecordingSink::default();

        router.on_command(&identity, Command::Start, &sink).await;
        let outcome = router.on_text(&identity, PASSWORD, &sink).await;

        assert!(outcome.carried_secret);
        assert!(sink.last().text.starts_with("✅ Wallet created!"));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let identity = UserIdentity::new("11");
        let mut book = MockLiquidityBook::new();
        book.expect_fetch_pool_addresses().returning(|| panic!("gateway client bug"));
        let router = Router::new(services(book, MockLedgerClient::new()), true);
        let sink = RecordingSink::default();

        router.on_action(&identity, actions::GET_ALL_POOLS, &sink).await;
        assert_eq!(sink.last().text, FALLBACK_REPLY);

        // the identity lock was released
        router.on_command(&identity, Command::Help, &sink).await;
        assert!(sink.last().text.contains("/swap"));
    }

    #[tokio::test]
    async fn test_unknown_text_shows_menu() {
        let identity = UserIdentity::new("11");
        let router = Router::new(services(MockLiquidityBook::new(), MockLedgerClient::new()), true);
        let sink = RecordingSink::default();

        router.on_text(&identity, "hello", &sink).await;

        assert_eq!(sink.last().choices, main_menu());
    }
}
