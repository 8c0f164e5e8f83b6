//! # Data Loader Crate
//!
//! This crate reads the library checkout exports into raw record types.
//!
//! ## Main Components
//!
//! - **types**: Raw rows (`RawUserRecord`, `RawItemRecord`, `RawInteractionRecord`)
//! - **parser**: `;`-separated CSV parsing with line-aware errors
//! - **tables**: Load all three tables at once
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{RawTables, TablePaths};
//! use std::path::Path;
//!
//! let tables = RawTables::load(&TablePaths::in_dir(Path::new("data/train")))?;
//! let (users, items, interactions) = tables.counts();
//! println!("{users} users, {items} items, {interactions} checkouts");
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod tables;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use tables::{RawTables, TablePaths};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Raw rows
    RawUserRecord,
    RawItemRecord,
    RawInteractionRecord,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tables() {
        let tables = RawTables::default();
        let (users, items, interactions) = tables.counts();

        assert_eq!(users, 0);
        assert_eq!(items, 0);
        assert_eq!(interactions, 0);
    }

    #[test]
    fn test_in_memory_records() {
        let user = RawUserRecord::new("1", Some("30"), Some("м"), None);
        assert_eq!(user.user_id, "1");
        assert_eq!(user.membership_type, None);

        let interaction = RawInteractionRecord::new("1", "A", "01.02.2020");
        assert_eq!(interaction.line, 0);
        assert_eq!(interaction.date.as_deref(), Some("01.02.2020"));

        let item = RawItemRecord::with_id("A");
        assert!(item.title.is_none());
    }
}
