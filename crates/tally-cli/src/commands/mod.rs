//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - `init` and shared utilities (open_db, load_config, parsing helpers)
//! - `import` - Statement import
//! - `transactions` - Transaction listing and manual edits
//! - `categories` - Categories, sub-categories and keyword rules
//! - `insights` - Ledger sweeps, insights and the period summary

pub mod categories;
pub mod core;
pub mod import;
pub mod insights;
pub mod transactions;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use import::*;
pub use insights::*;
pub use transactions::*;

/// Truncate a string to at most `max` characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// First characters of a fingerprint, enough to tell rows apart
pub fn short_fingerprint(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(8)]
}

/// Signed amount with colour: red for debits, green for credits
pub fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("\x1b[31m{:.2}\x1b[0m", amount)
    } else {
        format!("\x1b[32m+{:.2}\x1b[0m", amount)
    }
}
