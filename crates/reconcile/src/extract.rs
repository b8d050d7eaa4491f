//! Manifest extraction from an evaluated tree
//!
//! Templates may nest manifests at any depth. Extraction flattens them into
//! a map keyed by their dotted path in the tree (`.app.deployment`,
//! `.items.[0]`).

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Manifests found in a tree, keyed by dotted path
pub type Manifests = BTreeMap<String, Value>;

/// A leaf that is neither a manifest nor a container
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "recursion did not resolve in a manifest: in path `{path}` found key `{key}` of type `{}` instead",
    type_name(.value)
)]
pub struct ExtractError {
    /// Dotted path of the parent
    pub path: String,
    /// Key (or `[index]`) of the offending leaf
    pub key: String,
    /// The offending leaf
    pub value: Value,
}

/// Check if an object carries non-empty string `apiVersion` and `kind`
pub fn is_manifest(obj: &Map<String, Value>) -> bool {
    let non_empty = |key: &str| obj.get(key).and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    non_empty("apiVersion") && non_empty("kind")
}

/// Collect every manifest in `raw`
///
/// Objects are walked by sorted key and arrays by index. `null` members are
/// skipped so conditionally omitted entries do not count as leaves.
pub fn extract(raw: &Value) -> Result<Manifests, ExtractError> {
    let mut found = Manifests::new();
    walk(raw, &mut Trace::default(), &mut found)?;
    Ok(found)
}

fn walk(value: &Value, trace: &mut Trace, found: &mut Manifests) -> Result<(), ExtractError> {
    match value {
        Value::Object(obj) if is_manifest(obj) => {
            found.insert(trace.to_string(), value.clone());
            Ok(())
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            for key in keys {
                let child = &obj[key];
                if child.is_null() {
                    continue;
                }
                trace.push(key.clone());
                walk(child, trace, found)?;
                trace.pop();
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                trace.push(format!("[{i}]"));
                walk(item, trace, found)?;
                trace.pop();
            }
            Ok(())
        }
        leaf => Err(ExtractError {
            path: trace.base(),
            key: trace.name().to_string(),
            value: leaf.clone(),
        }),
    }
}

#[derive(Debug, Default)]
struct Trace(Vec<String>);

impl Trace {
    fn push(&mut self, segment: String) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn base(&self) -> String {
        let parent = self.0.len().saturating_sub(1);
        format!(".{}", self.0[..parent].join("."))
    }

    fn name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.0.join("."))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
