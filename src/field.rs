//! Dot-separated field paths and nested value lookup.
//!
//! CSV exports usually flatten nested event attributes into dotted column
//! headers (`attributes.interaction.response.0.value`), but some cells hold
//! a JSON document instead. A [`FieldPath`] resolves against both: a column
//! whose header matches the whole path wins, otherwise the longest matching
//! header prefix is parsed as JSON and the remaining segments walk into it.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::record::Record;

/// A dot-separated path into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        Self {
            raw: path.to_string(),
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve this path against a record, returning the scalar found there
    /// in textual form.
    ///
    /// Returns `None` when the path does not exist, or ends on an object,
    /// an array or a JSON null.
    pub fn resolve<'r>(&self, record: &'r Record) -> Option<Cow<'r, str>> {
        if let Some(cell) = record.get(&self.raw) {
            return Some(Cow::Borrowed(cell));
        }

        for split in (1..self.segments.len()).rev() {
            let column = self.segments[..split].join(".");
            let Some(cell) = record.get(&column) else {
                continue;
            };
            let Some(tree) = parse_nested(cell) else {
                continue;
            };
            return lookup(&tree, &self.segments[split..])
                .and_then(scalar_text)
                .map(Cow::Owned);
        }
        None
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse a cell as a JSON object or array. Plain scalars stay flat.
fn parse_nested(cell: &str) -> Option<Value> {
    let trimmed = cell.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// Walk `segments` into `value`.
///
/// Objects are indexed by key, arrays by a numeric segment. Any segment
/// left over once a scalar is reached means the path does not exist.
pub fn lookup<'v, S: AsRef<str>>(value: &'v Value, segments: &[S]) -> Option<&'v Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value);
    };
    let head = head.as_ref();
    match value {
        Value::Object(map) => lookup(map.get(head)?, rest),
        Value::Array(items) => {
            let index: usize = head.parse().ok()?;
            lookup(items.get(index)?, rest)
        }
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
