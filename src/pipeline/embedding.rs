//! Embedding fix-up: force every chunk vector to one fixed length.
//!
//! Vector indexes reject mixed dimensions, so each embedding is truncated to
//! its first `dim` elements and then right-padded with `0.0`. Element types
//! are not checked here. A cell that failed structured parsing arrives as a
//! one-string list and is padded like any other; callers can count such
//! elements with [`count_non_numeric`].

use serde_json::Value;

/// Fix a list value to exactly `dim` elements; anything but an array yields `[]`.
pub fn fix_embedding(raw: &Value, dim: usize) -> Vec<Value> {
    match raw {
        Value::Array(items) => fix_embedding_list(items.clone(), dim),
        _ => Vec::new(),
    }
}

/// Owned form of [`fix_embedding`] for an already-normalised list.
pub fn fix_embedding_list(mut items: Vec<Value>, dim: usize) -> Vec<Value> {
    if items.len() != dim {
        items.truncate(dim);
        items.resize(dim, Value::from(0.0));
    }
    items
}

/// Number of elements that are not JSON numbers.
pub fn count_non_numeric(values: &[Value]) -> usize {
    values.iter().filter(|v| !v.is_number()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ramp(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::from(i as f64 + 1.0)).collect()
    }

    #[test]
    fn short_vector_zero_padded() {
        let fixed = fix_embedding(&Value::Array(ramp(500)), 768);
        assert_eq!(fixed.len(), 768);
        assert_eq!(&fixed[..500], &ramp(500)[..]);
        assert!(fixed[500..].iter().all(|v| v == &json!(0.0)));
    }

    #[test]
    fn long_vector_truncated() {
        let fixed = fix_embedding(&Value::Array(ramp(900)), 768);
        assert_eq!(fixed, ramp(768));
    }

    #[test]
    fn exact_length_unchanged() {
        assert_eq!(fix_embedding(&Value::Array(ramp(4)), 4), ramp(4));
    }

    #[test]
    fn empty_list_becomes_all_zeros() {
        let fixed = fix_embedding_list(Vec::new(), 3);
        assert_eq!(fixed, vec![json!(0.0), json!(0.0), json!(0.0)]);
    }

    #[test]
    fn non_list_is_empty() {
        assert!(fix_embedding(&json!("0.1 0.2"), 768).is_empty());
        assert!(fix_embedding(&Value::Null, 768).is_empty());
    }

    // Element types are not validated: a wrapped string is padded like a number.
    #[test]
    fn string_elements_pass_through() {
        let fixed = fix_embedding(&json!(["[0.1 0.2]"]), 3);
        assert_eq!(fixed, vec![json!("[0.1 0.2]"), json!(0.0), json!(0.0)]);
        assert_eq!(count_non_numeric(&fixed), 1);
    }
}
