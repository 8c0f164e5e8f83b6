//! Parser for the library's `;`-separated export files.
//!
//! All three tables share the same layout rules:
//! - first line is a header with the library's column names
//! - fields are separated by `;`
//! - empty fields mean "no value" and deserialize to `None`
//!
//! Unknown columns are ignored, so exports with extra columns still load.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Field separator used by every export file
pub const SEPARATOR: u8 = b';';

/// Short file name used in error messages
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(File::open(path)?)
}

/// Deserialize every row of a table, pairing it with its 1-based line number.
///
/// Works on any reader so tests can feed in-memory strings.
pub fn parse_table<T, R>(reader: R, file: &str) -> Result<Vec<(usize, T)>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(SEPARATOR)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let to_csv_error = |source: csv::Error| DataLoadError::CsvError {
        file: file.to_string(),
        source,
    };

    let headers = csv_reader.headers().map_err(to_csv_error)?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record.map_err(to_csv_error)?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.iter().all(|field| field.is_empty()) {
            continue; // Skip blank lines
        }
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line,
                reason: e.to_string(),
            })?;
        rows.push((line, row));
    }

    debug!("Parsed {} rows from {}", rows.len(), file);
    Ok(rows)
}

fn require(value: &str, field: &str, line: usize) -> Result<()> {
    if value.is_empty() {
        return Err(DataLoadError::MissingField {
            field: field.to_string(),
            line,
        });
    }
    Ok(())
}

/// Parse users from any reader
pub fn read_users<R: Read>(reader: R, file: &str) -> Result<Vec<RawUserRecord>> {
    parse_table::<RawUserRecord, _>(reader, file)?
        .into_iter()
        .map(|(line, user)| {
            require(&user.user_id, "chb", line)?;
            Ok(user)
        })
        .collect()
}

/// Parse items from any reader
pub fn read_items<R: Read>(reader: R, file: &str) -> Result<Vec<RawItemRecord>> {
    parse_table::<RawItemRecord, _>(reader, file)?
        .into_iter()
        .map(|(line, item)| {
            require(&item.item_id, "sys_numb", line)?;
            Ok(item)
        })
        .collect()
}

/// Parse interactions from any reader; each record remembers its line
pub fn read_interactions<R: Read>(reader: R, file: &str) -> Result<Vec<RawInteractionRecord>> {
    parse_table::<RawInteractionRecord, _>(reader, file)?
        .into_iter()
        .map(|(line, mut interaction)| {
            require(&interaction.user_id, "chb", line)?;
            require(&interaction.item_id, "sys_numb", line)?;
            interaction.line = line;
            Ok(interaction)
        })
        .collect()
}

/// Parse the users file
///
/// Columns: chb;age;gender;chit_type
pub fn parse_users(path: &Path) -> Result<Vec<RawUserRecord>> {
    read_users(open(path)?, &file_label(path))
}

/// Parse the items file
///
/// Columns: sys_numb;author;bbk;izd;title;year_izd
pub fn parse_items(path: &Path) -> Result<Vec<RawItemRecord>> {
    read_items(open(path)?, &file_label(path))
}

/// Parse the checkout transactions file
///
/// Columns: chb;sys_numb;date_1;is_printed;is_real;source;type
pub fn parse_interactions(path: &Path) -> Result<Vec<RawInteractionRecord>> {
    read_interactions(open(path)?, &file_label(path))
}
