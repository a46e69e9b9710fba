//! Parser for Python-style literal text, producing JSON values.
//!
//! Spreadsheet exports of data frames often store lists as their `repr`,
//! which is not JSON: strings may be single-quoted, `None`/`True`/`False`
//! replace `null`/`true`/`false`, tuples appear, and trailing commas are
//! legal. This module accepts that literal grammar (and JSON's keywords, so
//! real JSON parses too) and maps it onto [`serde_json::Value`]:
//!
//! | Literal | Value |
//! |---------|-------|
//! | `[..]`, `(a, b)`, `{a, b}` | array |
//! | `{k: v}` | object (non-string keys use their JSON text) |
//! | `'..'`, `".."`, `'''..'''`, `r'..'`, adjacent strings | string |
//! | `1`, `-2.5e3`, `0x1f`, `1_000` | number |
//! | `None`/`null`, `True`/`true`, `False`/`false` | null / bool |
//!
//! Expressions, names, `inf`/`nan` and complex numbers are rejected.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Nesting limit for containers.
const MAX_DEPTH: usize = 128;

/// Why a literal failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at byte {pos}: {message}")]
pub struct LiteralError {
    pub pos: usize,
    pub message: String,
}

/// Parse `text` as a single literal. Surrounding whitespace is allowed.
pub fn parse(text: &str) -> Result<Value, LiteralError> {
    let mut p = Parser { src: text, pos: 0 };
    p.skip_ws();
    let v = p.value(0)?;
    p.skip_ws();
    if p.pos < p.src.len() {
        return Err(p.err("unexpected trailing characters"));
    }
    Ok(v)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn err(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            pos: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), LiteralError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.err(format!("expected '{c}'")))
        }
    }

    /// Skip whitespace and `#` comments.
    fn skip_ws(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(self.err("nesting too deep"));
        }
        match self.peek() {
            Some('[') => {
                self.bump();
                self.sequence(']', depth).map(Value::Array)
            }
            Some('(') => self.tuple(depth),
            Some('{') => self.brace(depth),
            Some('\'' | '"') => self.strings(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.word(),
            Some(_) => Err(self.err("unexpected character")),
            None => Err(self.err("unexpected end of input")),
        }
    }

    /// Comma-separated values up to `close`; the opener is already consumed.
    fn sequence(&mut self, close: char, depth: usize) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(',')?;
        }
    }

    /// `()` and `(a, ...)` are tuples; `(a)` is just `a`.
    fn tuple(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.expect('(')?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.value(depth + 1)?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.sequence(')', depth)?);
        Ok(Value::Array(items))
    }

    /// `{}` and `{k: v, ...}` are dicts; `{a, ...}` is a set.
    fn brace(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.expect('{')?;
        self.skip_ws();
        if self.eat('}') {
            return Ok(Value::Object(Map::new()));
        }
        let first = self.value(depth + 1)?;
        self.skip_ws();
        if !self.eat(':') {
            if self.eat('}') {
                return Ok(Value::Array(vec![first]));
            }
            self.expect(',')?;
            let mut items = vec![first];
            items.extend(self.sequence('}', depth)?);
            return Ok(Value::Array(items));
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            self.skip_ws();
            let v = self.value(depth + 1)?;
            map.insert(key_string(key), v);
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            self.expect(',')?;
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            key = self.value(depth + 1)?;
            self.skip_ws();
            self.expect(':')?;
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let first = self.string(false)?;
        self.strings_after(first).map(Value::String)
    }

    fn prefixed_quote_follows(&self) -> bool {
        let mut it = self.rest().chars();
        let _ = it.next();
        match it.next() {
            Some('\'' | '"') => true,
            Some(c) if is_string_prefix(c) => matches!(it.next(), Some('\'' | '"')),
            _ => false,
        }
    }

    /// `r'..'`, `u'..'`, `b'..'` and two-letter combinations like `rb'..'`.
    fn prefixed_string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        while let Some(c) = self.peek() {
            if c == '\'' || c == '"' {
                break;
            }
            if !is_string_prefix(c) {
                return Err(self.err("invalid string prefix"));
            }
            raw |= matches!(c, 'r' | 'R');
            self.bump();
        }
        self.string(raw)
    }

    fn string(&mut self, raw: bool) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.err("expected string"))?;
        let triple: String = [quote; 3].iter().collect();
        let long = self.rest().starts_with(&triple[..2]);
        if long {
            self.pos += 2 * quote.len_utf8();
        }

        let mut out = String::new();
        loop {
            if long && self.rest().starts_with(&triple) {
                self.pos += triple.len();
                return Ok(out);
            }
            let c = self.bump().ok_or_else(|| self.err("unterminated string"))?;
            match c {
                c if c == quote && !long => return Ok(out),
                '\n' if !long => return Err(self.err("newline in string")),
                '\\' if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '\\' => self.escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.err("unterminated escape"))?;
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'a' => out.push('\u{7}'),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or_else(|| self.err("bad octal escape"))?);
            }
            // Unknown escapes keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.err("truncated hex escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.err("bad hex escape"))?;
        let ch = char::from_u32(code).ok_or_else(|| self.err("escape is not a valid char"))?;
        self.pos = end;
        Ok(ch)
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_ws();

        let body_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                self.bump();
            } else if matches!(c, '+' | '-')
                && matches!(self.src[..self.pos].chars().last(), Some('e' | 'E'))
                && !self.src[body_start..self.pos].starts_with("0x")
                && !self.src[body_start..self.pos].starts_with("0X")
            {
                self.bump();
            } else {
                break;
            }
        }
        let body = &self.src[body_start..self.pos];
        if body.is_empty() {
            self.pos = start;
            return Err(self.err("expected number"));
        }

        parse_number(body, negative).ok_or_else(|| LiteralError {
            pos: start,
            message: format!("invalid number {body:?}"),
        })
    }

    fn word(&mut self) -> Result<Value, LiteralError> {
        let c = self.peek().unwrap_or(' ');
        if is_string_prefix(c) && self.prefixed_quote_follows() {
            let first = self.prefixed_string()?;
            return self.strings_after(first).map(Value::String);
        }

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "None" | "null" => Ok(Value::Null),
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            _ => {
                self.pos = start;
                Err(self.err("names are not literals"))
            }
        }
    }

    /// Append any string literals that directly follow an already-read one.
    fn strings_after(&mut self, mut out: String) -> Result<String, LiteralError> {
        loop {
            let save = self.pos;
            self.skip_ws();
            match self.peek() {
                Some('\'' | '"') => out.push_str(&self.string(false)?),
                Some(c) if is_string_prefix(c) && self.prefixed_quote_follows() => {
                    out.push_str(&self.prefixed_string()?)
                }
                _ => {
                    self.pos = save;
                    return Ok(out);
                }
            }
        }
    }
}

fn is_string_prefix(c: char) -> bool {
    matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B')
}

fn key_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn parse_number(body: &str, negative: bool) -> Option<Value> {
    if body.starts_with('_') || body.ends_with('_') || body.contains("__") {
        return None;
    }
    let cleaned = body.replace('_', "");
    let radix = match cleaned.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };

    if let Some(radix) = radix {
        let magnitude = u64::from_str_radix(&cleaned[2..], radix).ok()?;
        return Some(signed_int(magnitude, negative));
    }

    if cleaned.chars().all(|c| c.is_ascii_digit()) {
        // Leading zeros are only legal on zero itself.
        if cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.chars().any(|c| c != '0') {
            return None;
        }
        return match cleaned.parse::<u64>() {
            Ok(m) => Some(signed_int(m, negative)),
            Err(_) => float_value(&cleaned, negative),
        };
    }

    let is_float_text = cleaned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && cleaned.chars().any(|c| c.is_ascii_digit());
    if !is_float_text {
        return None;
    }
    float_value(&cleaned, negative)
}

fn signed_int(magnitude: u64, negative: bool) -> Value {
    if !negative {
        return Value::Number(Number::from(magnitude));
    }
    match i64::try_from(magnitude) {
        Ok(m) => Value::Number(Number::from(-m)),
        Err(_) if magnitude == i64::MIN.unsigned_abs() => Value::Number(Number::from(i64::MIN)),
        Err(_) => Number::from_f64(-(magnitude as f64)).map_or(Value::Null, Value::Number),
    }
}

fn float_value(text: &str, negative: bool) -> Option<Value> {
    let f: f64 = text.parse().ok()?;
    let f = if negative { -f } else { f };
    Number::from_f64(f).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_quoted_list() {
        assert_eq!(parse("['a','b']").unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn json_is_accepted() {
        assert_eq!(
            parse(r#"[{"k": [1, 2.5, true, null]}]"#).unwrap(),
            json!([{"k": [1, 2.5, true, null]}])
        );
    }

    #[test]
    fn python_keywords_and_trailing_comma() {
        assert_eq!(parse("[None, True, False,]").unwrap(), json!([null, true, false]));
    }

    #[test]
    fn tuples_and_sets() {
        assert_eq!(parse("('a', 'b')").unwrap(), json!(["a", "b"]));
        assert_eq!(parse("('a',)").unwrap(), json!(["a"]));
        assert_eq!(parse("('a')").unwrap(), json!("a"));
        assert_eq!(parse("()").unwrap(), json!([]));
        assert_eq!(parse("{1, 2}").unwrap(), json!([1, 2]));
        assert_eq!(parse("{}").unwrap(), json!({}));
    }

    #[test]
    fn dict_keys_stringified() {
        assert_eq!(parse("{'a': 1, 2: 'b',}").unwrap(), json!({"a": 1, "2": "b"}));
    }

    #[test]
    fn escapes() {
        assert_eq!(parse(r"'it\'s'").unwrap(), json!("it's"));
        assert_eq!(parse(r#""tab\there""#).unwrap(), json!("tab\there"));
        assert_eq!(parse(r"'\x41é\U0001F600'").unwrap(), json!("Aé😀"));
        assert_eq!(parse(r"'\101'").unwrap(), json!("A"));
        assert_eq!(parse(r"'\d'").unwrap(), json!("\\d"));
    }

    #[test]
    fn raw_and_prefixed_strings() {
        assert_eq!(parse(r"r'\n'").unwrap(), json!("\\n"));
        assert_eq!(parse("u'x'").unwrap(), json!("x"));
        assert_eq!(parse("[b'x', Rb'y']").unwrap(), json!(["x", "y"]));
    }

    #[test]
    fn triple_quoted_and_adjacent_strings() {
        assert_eq!(parse("'''a\n'b'\n'''").unwrap(), json!("a\n'b'\n"));
        assert_eq!(parse("['a' 'b', \"c\"]").unwrap(), json!(["ab", "c"]));
    }

    #[test]
    fn numbers() {
        assert_eq!(
            parse("[0, -1, +2, 3.5, -0.25, 1e3, 2.5E-2, 1_000, 0x1f, 0o17, 0b11, .5]").unwrap(),
            json!([0, -1, 2, 3.5, -0.25, 1000.0, 0.025, 1000, 31, 15, 3, 0.5])
        );
    }

    #[test]
    fn big_ints_become_floats() {
        let v = parse("123456789012345678901234567890").unwrap();
        assert!(v.is_f64());
    }

    #[test]
    fn comments_and_whitespace() {
        assert_eq!(parse("  [1, # first\n 2]\n").unwrap(), json!([1, 2]));
    }

    #[test]
    fn rejects_non_literals() {
        for bad in [
            "hello",
            "[a, b]",
            "[1, 2",
            "['a'",
            "'unterminated",
            "[1] [2]",
            "inf",
            "nan",
            "1j",
            "007",
            "1__0",
            "{'a' 1}",
            "'a\nb'",
            "",
        ] {
            assert!(parse(bad).is_err(), "expected error for {bad:?}");
        }
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let deep = format!("{}{}", "[".repeat(500), "]".repeat(500));
        assert!(parse(&deep).is_err());
    }

    #[test]
    fn error_reports_position() {
        let e = parse("[1, x]").unwrap_err();
        assert_eq!(e.pos, 4);
    }
}
