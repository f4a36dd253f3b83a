//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Database setup (init, import, seed) and shared utilities (open_db)
//! - `chat` - Interactive chat and single questions
//! - `reports` - Accounts, transactions, forecast, anomalies and health
//! - `serve` - Web server command
//! - `status` - Database and LLM status

pub mod chat;
pub mod core;
pub mod reports;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use chat::*;
pub use core::*;
pub use reports::*;
pub use serve::*;
pub use status::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
