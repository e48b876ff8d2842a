//! Forgiving field deserializers for LLM-produced JSON.
//!
//! Models routinely emit `null` for empty strings, numbers where text is expected,
//! or a single string where a list belongs. None of that should sink a whole
//! document, so each helper coerces instead of failing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Any scalar becomes text; `null` and objects become `""`; arrays are joined by newlines.
pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

/// A list of strings. A lone string becomes a one-element list; `null` becomes empty.
pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let single = value_to_string(other);
            if single.trim().is_empty() {
                Vec::new()
            } else {
                vec![single]
            }
        }
    })
}

pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// A nested record. Anything that is not a decodable object becomes `T::default()`.
pub fn record<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        item @ Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
        _ => T::default(),
    })
}

/// A list of records. Non-array values yield an empty list; elements that are not
/// objects, or that cannot be decoded, are dropped. Later positions shift down, so
/// synthesized ids count surviving elements only.
pub fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Lower-cased text of any scalar, for enum matching. `None` for everything else.
pub fn enum_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s.trim().to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null | Value::Object(_) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
