//! Slash commands understood by the bot

use teloxide::utils::command::BotCommands;

/// These commands are supported:
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Create or show your wallet.
    Start,
    /// Show your wallet address and balance.
    Wallet,
    /// Swap one token for another.
    Swap,
    /// List liquidity pools.
    Pools,
    /// Show your liquidity positions.
    Positions,
    /// Cancel the current operation.
    Cancel,
    /// Show this text.
    Help,
}
