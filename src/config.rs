//! Configuration types for table-to-document conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The core reads no environment
//! variables; the CLI maps its flags and `VERSE2JSON_*` variables onto the
//! builder.

use crate::error::Verse2JsonError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference embedding length (sentence-transformer base models).
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Number of commentary tokens kept in `verse_group_summary`.
pub const DEFAULT_SUMMARY_WORDS: usize = 20;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use verse2json::{ConversionConfig, ParseMode};
///
/// let config = ConversionConfig::builder()
///     .embedding_dim(384)
///     .parse_mode(ParseMode::Strict)
///     .build()
///     .unwrap();
/// assert_eq!(config.embedding_dim, 384);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// How list-like cells are parsed. Default: [`ParseMode::LiteralSyntax`].
    pub parse_mode: ParseMode,

    /// Target embedding length N. Default: 768.
    ///
    /// Every chunk's embedding is truncated or zero-padded to exactly this
    /// many elements so downstream vector indexes see one fixed dimension.
    pub embedding_dim: usize,

    /// HTML-unescape verse text and commentary. Default: true.
    pub decode_html: bool,

    /// Emit `verse_group_summary`. Default: true.
    pub include_summary: bool,

    /// Whitespace tokens of commentary kept in the summary. Default: 20.
    pub summary_words: usize,

    /// Emit a `verse_uid` on each verse. Default: false.
    ///
    /// The uid is the zero-padded chapter and verse, e.g. `"002005"`.
    pub emit_verse_uid: bool,

    /// Check that the first verse marker is the lowest number. Default: true.
    ///
    /// Observational only: a failed check adds a [`crate::Diagnostic`] and
    /// never changes the emitted verses.
    pub validate_verse_order: bool,

    /// Optional per-row progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            parse_mode: ParseMode::default(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            decode_html: true,
            include_summary: true,
            summary_words: DEFAULT_SUMMARY_WORDS,
            emit_verse_uid: false,
            validate_verse_order: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("parse_mode", &self.parse_mode)
            .field("embedding_dim", &self.embedding_dim)
            .field("decode_html", &self.decode_html)
            .field("include_summary", &self.include_summary)
            .field("summary_words", &self.summary_words)
            .field("emit_verse_uid", &self.emit_verse_uid)
            .field("validate_verse_order", &self.validate_verse_order)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.config.parse_mode = mode;
        self
    }

    pub fn embedding_dim(mut self, n: usize) -> Self {
        self.config.embedding_dim = n;
        self
    }

    pub fn decode_html(mut self, v: bool) -> Self {
        self.config.decode_html = v;
        self
    }

    pub fn include_summary(mut self, v: bool) -> Self {
        self.config.include_summary = v;
        self
    }

    pub fn summary_words(mut self, n: usize) -> Self {
        self.config.summary_words = n;
        self
    }

    pub fn emit_verse_uid(mut self, v: bool) -> Self {
        self.config.emit_verse_uid = v;
        self
    }

    pub fn validate_verse_order(mut self, v: bool) -> Self {
        self.config.validate_verse_order = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Verse2JsonError> {
        let c = &self.config;
        if c.embedding_dim == 0 {
            return Err(Verse2JsonError::InvalidConfig(
                "Embedding dimension must be ≥ 1".into(),
            ));
        }
        if c.include_summary && c.summary_words == 0 {
            return Err(Verse2JsonError::InvalidConfig(
                "Summary word count must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Parsing policy for list-like cells (macro-analysis fields, contextual
/// questions, embeddings).
///
/// All three modes share the same fallback: a cell that does not parse is
/// wrapped as a one-element list holding the raw text, so no mode ever fails
/// a row.
///
/// | Mode | Accepts |
/// |------|---------|
/// | `Strict` | RFC 8259 JSON only |
/// | `LenientJson` | JSON after rewriting `'` to `"` |
/// | `LiteralSyntax` | Python-style literals: single or double quotes, tuples, `None`/`True`/`False`, trailing commas (default) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseMode {
    /// Strict JSON.
    Strict,
    /// JSON with single quotes rewritten to double quotes first.
    LenientJson,
    /// Language-native literal syntax. (default)
    #[default]
    LiteralSyntax,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let c = ConversionConfig::default();
        assert_eq!(c.embedding_dim, 768);
        assert_eq!(c.summary_words, 20);
        assert_eq!(c.parse_mode, ParseMode::LiteralSyntax);
        assert!(c.decode_html);
        assert!(!c.emit_verse_uid);
    }

    #[test]
    fn zero_embedding_dim_rejected() {
        let err = ConversionConfig::builder().embedding_dim(0).build();
        assert!(matches!(err, Err(Verse2JsonError::InvalidConfig(_))));
    }

    #[test]
    fn zero_summary_words_allowed_when_summary_disabled() {
        let c = ConversionConfig::builder()
            .include_summary(false)
            .summary_words(0)
            .build();
        assert!(c.is_ok());
    }

    #[test]
    fn debug_hides_callback() {
        let s = format!("{:?}", ConversionConfig::default());
        assert!(s.contains("embedding_dim"));
        assert!(s.contains("progress_callback: None"));
    }
}
