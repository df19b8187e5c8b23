//! Record helpers
//!
//! Records are plain JSON objects. Every projection in the framework
//! (`optionValue`, `optionText`, record representations, filters) addresses
//! record fields through dotted paths such as `author.name`.

use serde_json::{Map, Value};

/// A record as returned by a data provider
pub type Record = Value;

/// Read a (possibly dotted) property path from a record
///
/// Array segments are addressed by index (`tags.0`).
pub fn get_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(record);
    }
    path.split('.').try_fold(record, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write a (possibly dotted) property path, creating intermediate objects
pub fn set_path(record: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = record;
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// String form of a value, used to compare ids coming from different sources
///
/// Strings are returned without quotes so that `"1"` and `1` compare equal.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_key).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Truthiness in the loose sense used for flags stored on records
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
