//! Progress-callback trait for per-row conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the assembler walks the primary table. The CLI uses this to
//! drive its progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use verse2json::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     rows: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_row_complete(&self, _row: usize, _total: usize, _verse_group: &str, _chunks: usize) {
//!         self.rows.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { rows: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Diagnostic;
use std::sync::Arc;

/// Called by the assembler as it builds each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The trait is `Send + Sync` so a config holding a
/// callback can be shared across threads.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first row is assembled.
    ///
    /// # Arguments
    /// * `total_rows` : number of primary rows that will be processed
    fn on_conversion_start(&self, total_rows: usize) {
        let _ = total_rows;
    }

    /// Called after a document is built.
    ///
    /// # Arguments
    /// * `row_num`     : 1-indexed primary row number
    /// * `total_rows`  : total primary rows
    /// * `verse_group` : the row's group key
    /// * `chunks`      : number of chunk rows joined onto the document
    fn on_row_complete(&self, row_num: usize, total_rows: usize, verse_group: &str, chunks: usize) {
        let _ = (row_num, total_rows, verse_group, chunks);
    }

    /// Called once per diagnostic raised while building a row.
    fn on_row_diagnostic(&self, row_num: usize, diagnostic: &Diagnostic) {
        let _ = (row_num, diagnostic);
    }

    /// Called once after all rows have been assembled.
    ///
    /// # Arguments
    /// * `total_rows`  : total primary rows
    /// * `diagnostics` : diagnostics raised across all rows
    fn on_conversion_complete(&self, total_rows: usize, diagnostics: usize) {
        let _ = (total_rows, diagnostics);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
