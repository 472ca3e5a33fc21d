//! TOML front matter between `+++` lines at the top of a source file.
use anyhow::{Context, Result};
use serde_json::{Map, Number, Value};

const FENCE: &str = "+++";

/// The raw TOML block, if the content opens with one.
fn block(content: &str) -> Option<&str> {
    let rest = content
        .strip_prefix("+++\n")
        .or_else(|| content.strip_prefix("+++\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Parse front matter into file data. No block means no data.
pub fn parse(content: &str) -> Result<Map<String, Value>> {
    let Some(src) = block(content) else {
        return Ok(Map::new());
    };
    let table: toml::Table = toml::from_str(src).context("parse front matter")?;
    Ok(table.into_iter().map(|(k, v)| (k, to_json(v))).collect())
}

/// TOML datetimes become their RFC 3339 text.
fn to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        toml::Value::Table(table) => {
            Value::Object(table.into_iter().map(|(k, v)| (k, to_json(v))).collect())
        }
    }
}
