//! Loose-value normalisation: list-like cells, commentary text, summaries.
//!
//! List-like cells arrive in whatever shape the upstream spreadsheet left
//! them: JSON arrays, Python `repr` lists with single quotes, a bare string,
//! or nothing at all. [`normalize_list`] turns any of these into a list and
//! never fails:
//!
//! 1. missing or blank cell → `[]`
//! 2. already-typed array → its elements
//! 3. text → structured parse per [`ParseMode`]; a parsed non-list `v`
//!    becomes `[v]` as its display text
//! 4. unparseable text → `[raw_text]`, flagged as malformed

use crate::config::ParseMode;
use crate::pipeline::literal;
use crate::table::Cell;
use serde_json::Value;
use std::borrow::Cow;

/// Characters of the raw cell kept in diagnostics.
const PREVIEW_CHARS: usize = 40;

/// Marker appended to `verse_group_summary`.
pub const SUMMARY_ELLIPSIS: &str = "...";

/// Result of normalising one list-like cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedList {
    pub values: Vec<Value>,
    /// True when structured parsing failed and the raw text was wrapped.
    pub malformed: bool,
}

/// Normalise a list-like cell under `mode`.
pub fn normalize_list(cell: &Cell, mode: ParseMode) -> NormalizedList {
    match cell {
        Cell::Missing => NormalizedList::default(),
        Cell::Value(Value::Array(items)) => NormalizedList {
            values: items.clone(),
            malformed: false,
        },
        Cell::Value(other) => NormalizedList {
            values: vec![Value::String(display(other))],
            malformed: false,
        },
        Cell::Text(raw) if raw.trim().is_empty() => NormalizedList::default(),
        Cell::Text(raw) => match parse_structured(raw.trim(), mode) {
            Some(Value::Array(items)) => NormalizedList {
                values: items,
                malformed: false,
            },
            Some(scalar) => NormalizedList {
                values: vec![Value::String(display(&scalar))],
                malformed: false,
            },
            None => NormalizedList {
                values: vec![Value::String(raw.clone())],
                malformed: true,
            },
        },
    }
}

/// [`normalize_list`] with every element rendered as a string.
pub fn normalize_string_list(cell: &Cell, mode: ParseMode) -> (Vec<String>, bool) {
    let n = normalize_list(cell, mode);
    (into_strings(n.values), n.malformed)
}

/// Render list elements as strings; strings pass through, other values use
/// their literal form ([`display`]).
pub fn into_strings(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s,
            other => display(&other),
        })
        .collect()
}

fn parse_structured(text: &str, mode: ParseMode) -> Option<Value> {
    match mode {
        ParseMode::Strict => serde_json::from_str(text).ok(),
        ParseMode::LenientJson => serde_json::from_str(&text.replace('\'', "\"")).ok(),
        ParseMode::LiteralSyntax => literal::parse(text).ok(),
    }
}

/// Text form of a parsed value as the literal grammar writes it: strings
/// bare, `None`/`True`/`False` capitalised, containers in repr form
/// (`{'a': 1}`, `['x', 2]`).
pub fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => repr(other),
    }
}

fn repr(v: &Value) -> String {
    match v {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), repr(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Single-quoted unless the text holds `'` but no `"`.
fn quote(s: &str) -> String {
    let q = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

/// Decode HTML character references (`&amp;`, `&#39;`, `&nbsp;`, ...).
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Commentary as emitted: optionally HTML-decoded, trimmed; `None` if missing.
pub fn clean_commentary(cell: &Cell, decode_html: bool) -> Option<String> {
    let text = cell.as_text()?;
    let text = if decode_html {
        decode_entities(&text).into_owned()
    } else {
        text.into_owned()
    };
    Some(text.trim().to_string())
}

/// First `words` whitespace tokens of `text` followed by [`SUMMARY_ELLIPSIS`].
///
/// `None` for blank text.
pub fn summarize(text: &str, words: usize) -> Option<String> {
    let head: Vec<&str> = text.split_whitespace().take(words).collect();
    if head.is_empty() {
        return None;
    }
    Some(format!("{}{}", head.join(" "), SUMMARY_ELLIPSIS))
}

/// Short, char-boundary-safe excerpt of a raw cell for diagnostics.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}\u{2026}")
    } else {
        head
    }
}
