//! Telegram transport
//!
//! Everything that knows about teloxide lives here. The flows only see
//! [`ReplySink`](crate::application::flows::ReplySink).

pub mod commands;
pub mod dispatcher;
pub mod sink;

pub use commands::Command;
pub use dispatcher::{schema, HandlerError, HandlerResult, Router, TextOutcome};
pub use sink::{keyboard, TelegramSink};
