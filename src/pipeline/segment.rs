//! Verse segmentation: split a translation blob into numbered verses.
//!
//! A translation cell holds several verses run together, each introduced by
//! its number and whitespace:
//!
//! ```text
//! 1 In the beginning 2 there was light
//! ```
//!
//! Every `digits + whitespace` occurrence starts a new verse. Verses keep the
//! order their markers appear in, not numeric order; an out-of-order block is
//! reported through [`Diagnostic::VerseOrder`] but emitted as found.
//!
//! Text with no markers at all yields no verses. The whole blob is dropped in
//! that case and only a [`Diagnostic::NoVerseMarkers`] records it.

use crate::config::ConversionConfig;
use crate::error::Diagnostic;
use crate::output::VerseRecord;
use crate::pipeline::normalize::decode_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Chapter token used in verse ids when the verse group has no chapter.
pub const MISSING_CHAPTER: &str = "unknown";

static RE_VERSE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)\s").unwrap());

static RE_LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());

/// Verses of one translation plus the diagnostics raised while splitting it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmented {
    pub verses: Vec<VerseRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Split `text` into verses of `chapter` using default options.
pub fn split_verses(text: &str, chapter: Option<u32>) -> Vec<VerseRecord> {
    split_translation(text, chapter, "", &ConversionConfig::default()).verses
}

/// Split `text` into verses of `chapter`.
///
/// `verse_group` only labels diagnostics. `config` controls HTML decoding,
/// `verse_uid` emission and the verse-order check.
pub fn split_translation(
    text: &str,
    chapter: Option<u32>,
    verse_group: &str,
    config: &ConversionConfig,
) -> Segmented {
    let mut out = Segmented::default();
    let markers: Vec<_> = RE_VERSE_MARKER.captures_iter(text).collect();

    if markers.is_empty() {
        if !text.trim().is_empty() {
            out.diagnostics.push(Diagnostic::NoVerseMarkers {
                verse_group: verse_group.to_string(),
                chars: text.chars().count(),
            });
        }
        return out;
    }

    let chapter_token = chapter.map_or_else(|| MISSING_CHAPTER.to_string(), |c| c.to_string());

    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let verse_number = match digits.as_str().parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                out.diagnostics.push(Diagnostic::VerseNumberOverflow {
                    verse_group: verse_group.to_string(),
                    marker: digits.as_str().to_string(),
                });
                u64::MAX
            }
        };

        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());

        out.verses.push(VerseRecord {
            verse_number,
            verse_id: format!("{chapter_token}:{verse_number}"),
            verse_uid: match chapter {
                Some(c) if config.emit_verse_uid => Some(format!("{c:03}{verse_number:03}")),
                _ => None,
            },
            text: clean_verse_text(&text[whole.end()..end], config.decode_html),
        });
    }

    if config.validate_verse_order {
        if let Some(d) = check_verse_order(&out.verses, verse_group) {
            out.diagnostics.push(d);
        }
    }

    debug!(
        "Split {:?} into {} verses",
        verse_group,
        out.verses.len()
    );
    out
}

/// Flag a block whose first verse is not its lowest-numbered one.
fn check_verse_order(verses: &[VerseRecord], verse_group: &str) -> Option<Diagnostic> {
    let first = verses.first()?.verse_number;
    let min = verses.iter().map(|v| v.verse_number).min()?;
    (first != min).then(|| Diagnostic::VerseOrder {
        verse_group: verse_group.to_string(),
        first,
        min,
    })
}

fn clean_verse_text(span: &str, decode_html: bool) -> String {
    let collapsed = RE_LINE_BREAK.replace_all(span, " ");
    let trimmed = collapsed.trim();
    if decode_html {
        decode_entities(trimmed).trim().to_string()
    } else {
        trimmed.to_string()
    }
}
