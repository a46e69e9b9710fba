//! # verse2json
//!
//! Join a verse-commentary table and a commentary-chunk table into nested,
//! per-verse-group JSON documents ready for a semantic-search index.
//!
//! ## Inputs
//!
//! - **Primary table**: one row per verse group (`"2.1-10"` style key) with
//!   a numbered translation blob, an English commentary and six list-valued
//!   commentary-metadata columns.
//! - **Secondary table**: one row per commentary chunk, keyed by
//!   `Commentary Group`, carrying theme fields and an embedding vector.
//!
//! List cells arrive loosely formatted (Python-literal text, JSON text, or
//! plain prose). Every cell is coerced to a list without ever failing the
//! run; problems are reported as [`Diagnostic`]s on the affected document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! primary CSV ─┐
//!              ├─ 1. Input     CSV → Table (typed cells)
//! chunk CSV  ──┘
//!                 2. Chapter   "2.1-10" → 2
//!                 3. Segment   "1 … 2 …" → verses 2:1, 2:2
//!                 4. Normalize list cells, commentary, summary
//!                 5. Embedding fix every vector to 768 elements
//!                 6. Assemble  one Document per primary row + joined chunks
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verse2json::{convert_files, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_files("verses.csv", "chunks.csv", &config)?;
//!     println!("{}", output.to_json(true)?);
//!     for d in output.diagnostics() {
//!         eprintln!("warning: {d}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `verse2json` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! verse2json = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ParseMode};
pub use convert::{
    assemble_document, assemble_documents, convert, convert_files, convert_files_with,
    convert_rows, convert_to_file, write_json,
};
pub use error::{Diagnostic, Verse2JsonError};
pub use output::{
    documents_to_json, ChunkRecord, ConversionOutput, ConversionStats, Document, MacroAnalysis,
    VerseRecord,
};
pub use pipeline::chapter::extract_chapter;
pub use pipeline::embedding::fix_embedding;
pub use pipeline::input::{read_table, read_table_with};
pub use pipeline::normalize::normalize_list;
pub use pipeline::segment::split_verses;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use table::{Cell, PrimaryRow, SecondaryRow, Table};
