//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db)
//! - `expenses` - Expense commands (add, import, users, list, purge)
//! - `forecast` - Local forecast for one user
//! - `serve` - Web server command

pub mod core;
pub mod expenses;
pub mod forecast;
pub mod serve;

// Re-export command functions for main.rs
pub use core::*;
pub use expenses::*;
pub use forecast::*;
pub use serve::*;

/// Truncate a string to `max` characters, adding an ellipsis if cut
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
