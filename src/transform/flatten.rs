//! Recursive JSON flattening.
//!
//! Turns one nested issue record into a single-level mapping of scalar
//! values suitable for a CSV row. Arrays become comma-joined strings under
//! a `<key>_list` column; nested objects are merged into the parent level
//! (or namespaced by path, see [`NestedKeys`]).

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Hard cap on nesting depth. Real Snyk payloads nest three or four
/// levels; anything past this is treated as malformed input.
pub const MAX_DEPTH: usize = 64;

/// Error raised when a record cannot be flattened.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlattenError {
    /// The input tree nests deeper than [`MAX_DEPTH`] levels.
    #[error("input nesting exceeds {MAX_DEPTH} levels")]
    DepthExceeded,
}

/// A single flattened cell value.
///
/// Serializes untagged, so a `FlatRecord` round-trips to plain JSON
/// scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean cell.
    Bool(bool),
    /// Numeric cell; keeps the JSON number representation intact.
    Number(serde_json::Number),
    /// Text cell. JSON `null` flattens to the empty string.
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// A flattened record: one scalar per column, no nesting left.
pub type FlatRecord = BTreeMap<String, Scalar>;

/// How keys of nested objects land in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestedKeys {
    /// Merge child keys into the parent level unprefixed. Colliding keys
    /// are silently overwritten, deepest write wins. This matches the
    /// column names existing CSV consumers already depend on.
    #[default]
    Merge,
    /// Namespace child keys by path (`parent.child`), which makes
    /// collisions impossible.
    PathPrefix,
}

/// Options for [`flatten_with`].
#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    /// Key handling for nested objects.
    pub nested_keys: NestedKeys,
}

/// Flatten a record with default options ([`NestedKeys::Merge`]).
pub fn flatten(record: &Map<String, Value>) -> Result<FlatRecord, FlattenError> {
    flatten_with(record, &FlattenOptions::default())
}

/// Flatten a record into a [`FlatRecord`].
///
/// Pure function: no I/O, and the output key set is determined solely by
/// the input shape and options.
pub fn flatten_with(
    record: &Map<String, Value>,
    options: &FlattenOptions,
) -> Result<FlatRecord, FlattenError> {
    let mut out = FlatRecord::new();
    flatten_into(record, "", 0, options, &mut out)?;
    Ok(out)
}

fn flatten_into(
    record: &Map<String, Value>,
    prefix: &str,
    depth: usize,
    options: &FlattenOptions,
    out: &mut FlatRecord,
) -> Result<(), FlattenError> {
    if depth >= MAX_DEPTH {
        return Err(FlattenError::DepthExceeded);
    }

    for (key, value) in record {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Object(child) => {
                let child_prefix = match options.nested_keys {
                    NestedKeys::Merge => "",
                    NestedKeys::PathPrefix => column.as_str(),
                };
                flatten_into(child, child_prefix, depth + 1, options, out)?;
            }
            Value::Array(items) => {
                out.insert(format!("{}_list", column), Scalar::Text(join_elements(items)));
            }
            scalar => {
                out.insert(column, scalar_value(scalar));
            }
        }
    }

    Ok(())
}

/// Comma-join array elements by their string forms. Non-scalar elements
/// fall back to compact JSON.
fn join_elements(items: &[Value]) -> String {
    items
        .iter()
        .map(element_text)
        .collect::<Vec<_>>()
        .join(",")
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn scalar_value(value: &Value) -> Scalar {
    match value {
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Number(n) => Scalar::Number(n.clone()),
        Value::String(s) => Scalar::Text(s.clone()),
        // Null and the container variants are handled by the caller;
        // null coerces to an empty display cell.
        _ => Scalar::Text(String::new()),
    }
}
