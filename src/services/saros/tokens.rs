//! Known token registry
//!
//! Symbols users can type instead of a mint, and the tokens offered when
//! creating a pair. Anything unknown is taken as a raw mint address.

use crate::core::domain::swap::{DEFAULT_TOKEN_DECIMALS, SOL_DECIMALS};

/// Wrapped SOL mint
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// A registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    /// Stable id used in callback data
    pub id: &'static str,
    /// Display symbol
    pub symbol: &'static str,
    /// Mint address
    pub mint: &'static str,
    /// Mint decimals
    pub decimals: u8,
}

/// Tokens offered for pair creation
pub const TOKENS: [TokenInfo; 5] = [
    TokenInfo { id: "wsol", symbol: "WSOL", mint: WSOL_MINT, decimals: SOL_DECIMALS },
    TokenInfo {
        id: "usdc",
        symbol: "USDC",
        mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        decimals: 6,
    },
    TokenInfo {
        id: "usdt",
        symbol: "USDT",
        mint: "Es9vMFrzaCERmJFr4Y7cHuaQSvq7SLWjtKh6zUZze7XA",
        decimals: 6,
    },
    TokenInfo {
        id: "jup",
        symbol: "JUP",
        mint: "JUPyEiTgC1uoXFLRzL6zZFxYQq1W3aG3W2rbmS6jwxCL",
        decimals: 6,
    },
    TokenInfo {
        id: "pyusd",
        symbol: "PYUSD",
        mint: "CXk2AMBfi3TwaEL2468s6zP8xq9NxTXjp9gjMgzeUynM",
        decimals: 6,
    },
];

/// Mint and decimals a user input resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    /// Mint address
    pub mint: String,
    /// Mint decimals
    pub decimals: u8,
    /// Symbol when the input matched the registry
    pub symbol: Option<&'static str>,
}

/// Resolve a symbol (case-insensitive, `SOL` is an alias of `WSOL`) or a raw mint
pub fn resolve(input: &str) -> ResolvedToken {
    let trimmed = input.trim();
    let key = trimmed.to_uppercase();
    let key = if key == "SOL" { "WSOL".to_string() } else { key };

    match TOKENS.iter().find(|t| t.symbol == key) {
        Some(token) => ResolvedToken {
            mint: token.mint.to_string(),
            decimals: token.decimals,
            symbol: Some(token.symbol),
        },
        None => ResolvedToken {
            mint: trimmed.to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
            symbol: None,
        },
    }
}

/// Registry entry by id or symbol, case-insensitive
pub fn by_id(id: &str) -> Option<&'static TokenInfo> {
    let key = id.trim().to_lowercase();
    TOKENS
        .iter()
        .find(|t| t.id == key || t.symbol.to_lowercase() == key)
}

/// Symbol of a known mint
pub fn symbol_for_mint(mint: &str) -> Option<&'static str> {
    TOKENS.iter().find(|t| t.mint == mint).map(|t| t.symbol)
}
