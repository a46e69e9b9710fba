//! Input loading: read a CSV file into a [`Table`].
//!
//! The core only sees [`Table`]s; this stage is the thin loader in front of
//! it. Cells are typed roughly the way a data-frame reader would type them so
//! that pass-through fields (`SectionNumber` and friends) come out as JSON
//! numbers rather than strings:
//!
//! - empty cell or a not-a-value token (`NaN`, `null`, `N/A`, ...) → missing
//! - integer or finite float text → number, but only when the number prints
//!   back as the same text (`"007"`, `"2.10"` and `"1e3"` stay text)
//! - anything else → text, kept verbatim
//!
//! The group-key columns are never typed: a key is matched by its exact text.

use crate::error::Verse2JsonError;
use crate::table::{columns, Cell, Table};
use serde_json::{Number, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Tokens read as a missing value, matching common data-frame defaults.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Read a CSV file with type inference enabled.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table, Verse2JsonError> {
    read_table_with(path, true)
}

/// Read a CSV file; with `infer_types = false` every non-empty cell is text.
pub fn read_table_with(path: impl AsRef<Path>, infer_types: bool) -> Result<Table, Verse2JsonError> {
    let path = resolve_local(path.as_ref())?;
    let file = std::fs::File::open(&path).map_err(|e| open_error(&path, e))?;
    let table = read_table_from(file, infer_types, &path)?;
    info!(
        "Loaded {} rows × {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

/// Read CSV from any reader. `origin` only labels errors.
pub fn read_table_from<R: Read>(
    reader: R,
    infer_types: bool,
    origin: &Path,
) -> Result<Table, Verse2JsonError> {
    let read_err = |source: csv::Error| Verse2JsonError::TableRead {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(read_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let is_key: Vec<bool> = headers
        .iter()
        .map(|h| columns::KEYS.contains(&h.as_str()))
        .collect();

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let cells = record
            .iter()
            .enumerate()
            .map(|(i, v)| match is_key.get(i) {
                Some(true) => key_cell(v, infer_types),
                _ => infer_cell(v, infer_types),
            })
            .collect();
        table.push_row(cells);
    }

    debug!("Parsed {} data rows from {}", table.len(), origin.display());
    Ok(table)
}

/// Type one raw CSV field.
pub fn infer_cell(raw: &str, infer_types: bool) -> Cell {
    if raw.is_empty() {
        return Cell::Missing;
    }
    if !infer_types {
        return Cell::Text(raw.to_string());
    }

    let trimmed = raw.trim();
    if NA_TOKENS.contains(&trimmed) {
        return Cell::Missing;
    }
    match parse_number(trimmed) {
        Some(n) if n.to_string() == trimmed => Cell::Value(Value::Number(n)),
        _ => Cell::Text(raw.to_string()),
    }
}

/// A group-key field: verbatim text, or missing when empty or a
/// not-a-value token.
pub fn key_cell(raw: &str, infer_types: bool) -> Cell {
    if raw.is_empty() || (infer_types && NA_TOKENS.contains(&raw.trim())) {
        Cell::Missing
    } else {
        Cell::Text(raw.to_string())
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Validate that a local CSV path exists and is readable.
fn resolve_local(path: &Path) -> Result<PathBuf, Verse2JsonError> {
    if !path.exists() {
        return Err(Verse2JsonError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return Err(Verse2JsonError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!("Resolved local CSV: {}", path.display());
    Ok(path.to_path_buf())
}

fn open_error(path: &Path, e: std::io::Error) -> Verse2JsonError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        Verse2JsonError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        Verse2JsonError::FileNotFound {
            path: path.to_path_buf(),
        }
    }
}
