//! Recursive scrubbing of JSON payloads.

use serde_json::{Map, Value};

use crate::guard::escape::escape_special_chars;

/// Keys that can reach an object's prototype when the payload is merged
/// into a JavaScript object downstream.
const DANGEROUS_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Sanitize a JSON value.
///
/// Objects lose prototype-pollution keys (case-insensitive), strings are
/// HTML-escaped, numbers and booleans pass through, and `null` is dropped.
/// A scalar at the top level yields an empty object.
///
/// Arrays stay arrays. Each element is sanitized as a value, so scalar
/// elements are kept and `null` elements are removed, shifting later
/// indices. Treating every element as a document instead would turn scalar
/// elements into `{}` and a top-level array into an index-keyed object.
pub fn sanitize_json(data: &Value) -> Value {
    match data {
        Value::Object(map) => Value::Object(sanitize_object(map)),
        Value::Array(items) => Value::Array(sanitize_array(items)),
        _ => Value::Object(Map::new()),
    }
}

fn sanitize_object(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        if is_dangerous_key(key) {
            continue;
        }
        if let Some(clean) = sanitize_value(value) {
            out.insert(key.clone(), clean);
        }
    }
    out
}

fn sanitize_array(items: &[Value]) -> Vec<Value> {
    items.iter().filter_map(sanitize_value).collect()
}

fn sanitize_value(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) => Some(Value::Object(sanitize_object(map))),
        Value::Array(items) => Some(Value::Array(sanitize_array(items))),
        Value::String(s) => Some(Value::String(escape_special_chars(s))),
        Value::Number(_) | Value::Bool(_) => Some(value.clone()),
        Value::Null => None,
    }
}

fn is_dangerous_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    DANGEROUS_KEYS.contains(&lowered.as_str())
}
