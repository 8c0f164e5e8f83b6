//! Raw record types for the library checkout tables.
//!
//! These mirror the columns of the three `;`-separated source files one to
//! one. Column names in the files are the library's own abbreviations
//! (`chb` is the reader card number, `sys_numb` the catalogue number), so each
//! field carries a serde rename.
//!
//! Records are immutable source rows: nothing downstream mutates them, the
//! pipeline crate only reads them to produce its own normalized types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// External identifier of a patron (reader card number)
pub type UserId = String;

/// External identifier of a catalogue item
pub type ItemId = String;

// =============================================================================
// Users
// =============================================================================

/// One row of `users.csv`.
///
/// `age` and `gender` are free text in the source system, so they stay
/// strings here. Sentinels like "не указан" are handled by the feature encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUserRecord {
    #[serde(rename = "chb")]
    pub user_id: UserId,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Membership type code
    #[serde(rename = "chit_type", default)]
    pub membership_type: Option<String>,
}

impl RawUserRecord {
    /// Build a record from plain string slices (handy in tests and fixtures)
    pub fn new(user_id: &str, age: Option<&str>, gender: Option<&str>, membership_type: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            age: age.map(str::to_string),
            gender: gender.map(str::to_string),
            membership_type: membership_type.map(str::to_string),
        }
    }
}

// =============================================================================
// Items
// =============================================================================

/// One row of `items.csv`. Only `item_id` is consumed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItemRecord {
    #[serde(rename = "sys_numb")]
    pub item_id: ItemId,
    #[serde(default)]
    pub author: Option<String>,
    /// Library classification code (BBK)
    #[serde(rename = "bbk", default)]
    pub classification: Option<String>,
    #[serde(rename = "izd", default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "year_izd", default)]
    pub year: Option<String>,
}

impl RawItemRecord {
    /// Item with an id and no metadata
    pub fn with_id(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            author: None,
            classification: None,
            publisher: None,
            title: None,
            year: None,
        }
    }
}

// =============================================================================
// Interactions
// =============================================================================

/// One row of the checkout transactions file.
///
/// The date is kept as text; its layout is ambiguous (day-first in most
/// exports) and is resolved by the interaction normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInteractionRecord {
    #[serde(rename = "chb")]
    pub user_id: UserId,
    #[serde(rename = "sys_numb")]
    pub item_id: ItemId,
    #[serde(rename = "date_1", default)]
    pub date: Option<String>,
    #[serde(default)]
    pub is_printed: Option<String>,
    #[serde(default)]
    pub is_real: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// 1-based line in the source file, filled in by the parser.
    /// Zero for records built in memory.
    #[serde(skip)]
    pub line: usize,
}

impl RawInteractionRecord {
    /// Build an in-memory record with only the fields the pipeline reads
    pub fn new(user_id: &str, item_id: &str, date: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            date: Some(date.to_string()),
            is_printed: None,
            is_real: None,
            source: None,
            kind: None,
            line: 0,
        }
    }
}
