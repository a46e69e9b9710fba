//! Pipeline stages for table-to-document conversion.
//!
//! Each submodule implements exactly one transformation step and is a pure
//! function of its inputs, so every stage is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ chapter ──▶ segment ──▶ normalize / embedding ──▶ (convert)
//! (CSV)     (C.S-E)     (verses)    (list cells, vectors)      (documents)
//! ```
//!
//! 1. [`input`]     : load a CSV file into a [`crate::Table`]
//! 2. [`chapter`]   : pull the chapter number out of a verse-group key
//! 3. [`segment`]   : split a numbered translation blob into verses
//! 4. [`normalize`] : coerce loosely formatted list cells into lists,
//!    using the [`literal`] parser for the default mode
//! 5. [`embedding`] : force embedding vectors to a fixed length

pub mod chapter;
pub mod embedding;
pub mod input;
pub mod literal;
pub mod normalize;
pub mod segment;
