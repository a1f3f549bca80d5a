//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `categories` - Category and subcategory management
//! - `core` - `Session`, init, and shared utilities (open_db)
//! - `import` - File import through a saved mapping
//! - `mappings` - Column mapping management
//! - `merchants` - Merchant rule management
//! - `transactions` - Transaction list/edit, unassigned report, reclassify

pub mod categories;
pub mod core;
pub mod import;
pub mod mappings;
pub mod merchants;
pub mod transactions;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use import::*;
pub use mappings::*;
pub use merchants::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
