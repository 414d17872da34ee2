//! Record flattening and filter matching for list data sources
//!
//! Data source filters are declared as `{ name, values }` blocks: every
//! block must match (AND), and within one block any value may match (OR).
//! Matching operates on a flattened view of each API record so the same
//! predicate works across resource types.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// One user-declared filter block.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub name: String,
    pub values: Vec<String>,
}

/// Flattened view of a record: lower-cased field name to JSON value.
pub type FlatRecord = HashMap<String, Value>;

/// Flatten a serializable record into a single-level field map.
///
/// Scalars and arrays map directly. Nested objects are flattened
/// recursively into the same namespace WITHOUT a key prefix; on collision
/// the last write wins. Filter names are matched against these keys
/// verbatim, so both behaviors are load-bearing.
pub fn flatten<T: Serialize>(record: &T) -> Result<FlatRecord, serde_json::Error> {
    let value = serde_json::to_value(record)?;
    let Value::Object(fields) = value else {
        return Err(serde::ser::Error::custom(
            "record did not serialize to an object",
        ));
    };

    let mut flat = FlatRecord::new();
    merge_fields(fields, &mut flat);
    Ok(flat)
}

fn merge_fields(fields: serde_json::Map<String, Value>, flat: &mut FlatRecord) {
    for (name, value) in fields {
        match value {
            Value::Object(nested) => merge_fields(nested, flat),
            other => {
                flat.insert(name.to_ascii_lowercase(), other);
            }
        }
    }
}

/// Decide whether a flattened record satisfies every filter spec.
///
/// A field missing from the record fails the whole predicate rather than
/// raising an error, and an empty `values` list matches nothing. Both are
/// deliberate defaults; tests pin them.
pub fn matches(specs: &[FilterSpec], record: &FlatRecord) -> bool {
    specs.iter().all(|spec| {
        let Some(value) = record.get(&spec.name) else {
            return false;
        };

        match value {
            Value::Array(items) => items.iter().any(|item| value_matches(item, &spec.values)),
            scalar => value_matches(scalar, &spec.values),
        }
    })
}

fn value_matches(value: &Value, allowed: &[String]) -> bool {
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // null and nested collections have no scalar string form
        _ => return false,
    };

    allowed.iter().any(|candidate| candidate == &rendered)
}
