//! JSON map helpers used when assembling render data.

use serde_json::{Map, Value};

/// Deep-merge `source` into `target`.
///
/// Objects are merged key by key; any other value in `source` replaces the
/// one in `target`.
pub fn merge(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Insert `value` at a dotted `path`, creating intermediate objects.
///
/// `site.title` = `x` becomes `{"site": {"title": "x"}}`. A non-object value
/// sitting on the path is replaced.
pub fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_owned(), value);
        }
        Some((head, rest)) => {
            let slot = target
                .entry(head.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(inner) = slot {
                insert_path(inner, rest, value);
            }
        }
    }
}

/// Render a value the way it appears in a permalink.
///
/// Strings are used as-is, `null` is empty, everything else uses its JSON
/// text.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
