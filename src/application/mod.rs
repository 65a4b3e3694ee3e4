//! Application layer module
//!
//! This module contains the application lifecycle, the Telegram transport
//! and the conversation flows driven by it.

pub mod app;
pub mod bot;
pub mod flows;

// Re-export main application type
pub use app::Application;
pub use bot::{Command, Router};
pub use flows::{main_menu, Choice, Reply, ReplySink};
