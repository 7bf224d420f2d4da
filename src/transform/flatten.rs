//! Flattening of nested result values into dotted numeric series.

use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Dotted key path → numeric leaf.
pub type FlatValues = BTreeMap<String, Number>;

/// Flatten a value tree.
///
/// Numbers are kept, strings only when they parse as a decimal, objects
/// recurse with `.` between path segments. Lists, booleans and nulls are
/// dropped. A numeric root maps to the empty key.
pub fn flatten(value: &Value) -> FlatValues {
    let mut values = FlatValues::new();
    fill(&mut values, "", value);
    values
}

fn fill(values: &mut FlatValues, prefix: &str, node: &Value) {
    match node {
        Value::Number(n) => {
            values.insert(prefix.to_string(), n.clone());
        }
        Value::String(s) => {
            if let Some(n) = parse_decimal(s) {
                values.insert(prefix.to_string(), n);
            }
        }
        Value::Object(fields) => {
            for (field, child) in fields {
                if prefix.is_empty() {
                    fill(values, field, child);
                } else {
                    fill(values, &format!("{prefix}.{field}"), child);
                }
            }
        }
        Value::Array(_) | Value::Bool(_) | Value::Null => {}
    }
}

/// Parse a plain decimal literal (`12`, `-0.5`, `1e3`).
///
/// Rejects `NaN`, `inf` and anything with surrounding whitespace.
pub fn parse_decimal(s: &str) -> Option<Number> {
    let plausible = !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !plausible {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Integer value of a number, truncated towards zero and saturating.
pub fn truncate(n: &Number) -> i64 {
    match n.as_i64() {
        Some(i) => i,
        None => n.as_f64().map(|f| f as i64).unwrap_or_default(),
    }
}
