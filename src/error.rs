//! Error types for the verse2json library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Verse2JsonError`]: **Fatal.** The conversion cannot proceed at all
//!   (no primary table, unreadable CSV, missing key column). Returned as
//!   `Err(Verse2JsonError)` from the top-level `convert*` functions.
//!
//! * [`Diagnostic`]: **Non-fatal.** A single row degraded to a best-effort
//!   value (no chapter found, malformed list cell, resized embedding) but the
//!   document was still produced. Stored on each
//!   [`crate::output::Document`] and aggregated in
//!   [`crate::output::ConversionOutput`] so callers can decide whether to
//!   report, log, or ignore them.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the verse2json library.
///
/// Row-level degradations use [`Diagnostic`] and never abort a run.
#[derive(Debug, Error)]
pub enum Verse2JsonError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No primary (verse-commentary) table was supplied.
    #[error("No primary table supplied; nothing to convert")]
    MissingPrimaryTable,

    /// A required key column is absent from a table header.
    #[error("{table} table has no '{column}' column")]
    MissingColumn { table: &'static str, column: String },

    /// Input file was not found at the given path.
    #[error("CSV file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The CSV reader rejected the file (bad UTF-8, unbalanced quotes, ...).
    #[error("Failed to read CSV '{path}': {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document serialisation failed.
    #[error("Failed to serialise documents: {0}")]
    Serialize(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal signal raised while building one document.
///
/// The document is still emitted; the diagnostic records which value was
/// degraded and why.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The verse group key carries no `C.S-E` range.
    #[error("{verse_group:?}: no chapter range found; verse ids use a placeholder chapter")]
    ChapterNotFound { verse_group: String },

    /// The translation contained no verse-number markers.
    #[error("{verse_group:?}: no verse markers in translation ({chars} chars dropped)")]
    NoVerseMarkers { verse_group: String, chars: usize },

    /// The first verse number is not the smallest one in the block.
    #[error("{verse_group:?}: first verse is {first} but lowest verse number is {min}")]
    VerseOrder {
        verse_group: String,
        first: u64,
        min: u64,
    },

    /// A verse marker had more digits than fit in a verse number.
    #[error("{verse_group:?}: verse marker {marker:?} overflows; clamped")]
    VerseNumberOverflow { verse_group: String, marker: String },

    /// A list-like cell failed structured parsing and was wrapped as text.
    #[error("{verse_group:?}: {field} is not a parseable list; wrapped as text ({preview:?})")]
    MalformedListCell {
        verse_group: String,
        field: String,
        preview: String,
    },

    /// An embedding was truncated or zero-padded to the target length.
    #[error("{verse_group:?}: chunk {chunk} embedding resized from {from} to {to}")]
    EmbeddingResized {
        verse_group: String,
        chunk: usize,
        from: usize,
        to: usize,
    },

    /// An embedding carries elements that are not numbers.
    #[error("{verse_group:?}: chunk {chunk} embedding has {count} non-numeric elements")]
    EmbeddingNotNumeric {
        verse_group: String,
        chunk: usize,
        count: usize,
    },
}
