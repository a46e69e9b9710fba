//! Chapter extraction from verse-group keys such as `"2.1-10"`.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_CHAPTER_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)\.[0-9]+-[0-9]+").unwrap());

/// Return the chapter of the first `<int>.<int>-<int>` range in `verse_group`.
///
/// `None` when no range is present or the chapter does not fit a `u32`.
pub fn extract_chapter(verse_group: &str) -> Option<u32> {
    RE_CHAPTER_RANGE
        .captures(verse_group)
        .and_then(|caps| caps[1].parse().ok())
}
