//! Loading the three raw tables together.
//!
//! [`RawTables`] is what the dataset pipeline consumes: the untouched user,
//! item and interaction rows. Column typing stops at "string or missing";
//! every domain rule lives in the pipeline crate.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Locations of the three export files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub users: PathBuf,
    pub items: PathBuf,
    pub interactions: PathBuf,
}

impl TablePaths {
    /// Default file names inside a single data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            users: data_dir.join("users.csv"),
            items: data_dir.join("items.csv"),
            interactions: data_dir.join("train_transactions_extended.csv"),
        }
    }
}

/// The raw users, items and interactions tables, as read from disk
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub users: Vec<RawUserRecord>,
    pub items: Vec<RawItemRecord>,
    pub interactions: Vec<RawInteractionRecord>,
}

impl RawTables {
    /// Read all three tables.
    ///
    /// The files are independent, so they are parsed in parallel with
    /// nested `rayon::join` calls. The first error wins.
    pub fn load(paths: &TablePaths) -> Result<Self> {
        info!("Loading library tables: {:?}", paths);

        let ((users, items), interactions) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_users(&paths.users),
                    || parser::parse_items(&paths.items),
                )
            },
            || parser::parse_interactions(&paths.interactions),
        );

        let tables = Self {
            users: users?,
            items: items?,
            interactions: interactions?,
        };

        let (users, items, interactions) = tables.counts();
        info!(
            "Loaded {} users, {} items, {} interactions",
            users, items, interactions
        );
        Ok(tables)
    }

    /// Row counts (users, items, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.items.len(), self.interactions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataLoadError;
    use std::fs;

    fn write_fixture(dir: &Path) {
        fs::write(
            dir.join("users.csv"),
            "chb;age;gender;chit_type\n1;30;м;a\n2;;ж;b\n",
        )
        .unwrap();
        fs::write(
            dir.join("items.csv"),
            "sys_numb;author;bbk;izd;title;year_izd\nA;x;y;z;Title A;2001\n",
        )
        .unwrap();
        fs::write(
            dir.join("train_transactions_extended.csv"),
            "chb;sys_numb;date_1;is_printed;is_real;source;type\n1;A;01.02.2020;1;1;s;t\n2;A;2020-02-03;1;1;s;t\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let tables = RawTables::load(&TablePaths::in_dir(dir.path())).unwrap();
        assert_eq!(tables.counts(), (2, 1, 2));
        assert_eq!(tables.interactions[1].line, 3);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        fs::remove_file(dir.path().join("items.csv")).unwrap();

        let result = RawTables::load(&TablePaths::in_dir(dir.path()));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }
}
