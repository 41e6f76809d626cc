//! Nested value maps addressed by wire names.

use serde_json::{Map, Value};

use crate::naming::tokenize;

/// Aggregate map of field values, keyed by top-level name segment.
pub type ValueMap = Map<String, Value>;

/// Look up a wire name in a nested map: `a[b]` reads `map["a"]["b"]`.
///
/// JSON `null` is treated the same as an absent key.
pub fn lookup<'a>(map: &'a ValueMap, name: &str) -> Option<&'a Value> {
    let tokens = tokenize(name);
    let (first, rest) = tokens.split_first()?;
    let mut current = map.get(first)?;
    for token in rest {
        current = match current {
            Value::Object(inner) => inner.get(token)?,
            Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

/// Store a value under a wire name, creating intermediate objects.
///
/// A scalar sitting where an intermediate object is needed is replaced.
pub fn insert(map: &mut ValueMap, name: &str, value: Value) {
    let tokens = tokenize(name);
    let Some((last, parents)) = tokens.split_last() else {
        return;
    };
    let mut current = map;
    for token in parents {
        let slot = current
            .entry(token.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(inner) => inner,
            _ => unreachable!("slot was just made an object"),
        };
    }
    current.insert(last.clone(), value);
}

/// Whether a value counts as "filled in" for validation purposes.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.values().all(|v| is_empty(Some(v))),
        Some(_) => false,
    }
}

/// Render a scalar value as form text. Arrays and objects have no text form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
