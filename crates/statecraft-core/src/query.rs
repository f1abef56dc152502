//! Read-only queries over the state tree
//!
//! None of these functions fail: missing data yields `None`, `false` or an
//! empty result.
//!
//! In a [`query`] path, a `*` segment expands across every key or index at
//! that position and the results are flattened. This differs from observer
//! patterns, where `*` matches exactly one segment and never expands.

use crate::predicate::{loosely_equal, Predicate};
use crate::{path, Value};
use indexmap::IndexMap;

/// Query path segment that expands across all children
pub const EXPAND: &str = "*";

/// How a single field of a record is matched
#[derive(Debug, Clone)]
pub enum FieldMatch {
    /// Field equals this value
    Literal(Value),
    /// Field satisfies this predicate
    Predicate(Predicate),
}

impl FieldMatch {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldMatch::Literal(expected) => loosely_equal(value, expected),
            FieldMatch::Predicate(p) => p.test(value),
        }
    }
}

impl From<Value> for FieldMatch {
    fn from(value: Value) -> Self {
        FieldMatch::Literal(value)
    }
}

impl From<&str> for FieldMatch {
    fn from(value: &str) -> Self {
        FieldMatch::Literal(value.into())
    }
}

impl From<i64> for FieldMatch {
    fn from(value: i64) -> Self {
        FieldMatch::Literal(value.into())
    }
}

impl From<bool> for FieldMatch {
    fn from(value: bool) -> Self {
        FieldMatch::Literal(value.into())
    }
}

impl From<Predicate> for FieldMatch {
    fn from(predicate: Predicate) -> Self {
        FieldMatch::Predicate(predicate)
    }
}

/// Filter applied to query results
#[derive(Debug, Clone)]
pub enum Filter {
    /// Keep items satisfying the predicate
    Predicate(Predicate),
    /// Keep records whose listed fields all match
    Fields(IndexMap<String, FieldMatch>),
}

impl Filter {
    /// Build a field filter from `(field, matcher)` pairs
    pub fn fields<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldMatch)>,
    {
        Filter::Fields(fields.into_iter().map(|(k, m)| (k.into(), m)).collect())
    }

    /// Check whether an item passes the filter
    pub fn matches(&self, item: &Value) -> bool {
        match self {
            Filter::Predicate(p) => p.test(item),
            Filter::Fields(fields) => fields
                .iter()
                .all(|(key, m)| item.get_key(key).is_some_and(|v| m.matches(v))),
        }
    }
}

impl From<Predicate> for Filter {
    fn from(predicate: Predicate) -> Self {
        Filter::Predicate(predicate)
    }
}

/// Resolve `path`; `None` when absent
pub fn get<'a>(state: &'a Value, path: &str) -> Option<&'a Value> {
    path::resolve(state, path)
}

/// Whether `path` exists, optionally also requiring `predicate` to hold
pub fn has(state: &Value, path: &str, predicate: Option<&Predicate>) -> bool {
    match (get(state, path), predicate) {
        (Some(value), Some(p)) => p.test(value),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Collect items at `path`
///
/// Sequences contribute their elements, any other value contributes
/// itself. Absent paths yield an empty result.
pub fn query<'a>(state: &'a Value, path: &str, filter: Option<&Filter>) -> Vec<&'a Value> {
    let mut targets = Vec::new();
    expand(state, &path::segments(path), &mut targets);

    let mut items = Vec::new();
    for target in targets {
        match target {
            Value::List(list) => items.extend(list.iter()),
            other => items.push(other),
        }
    }

    match filter {
        Some(f) => items.into_iter().filter(|item| f.matches(item)).collect(),
        None => items,
    }
}

fn expand<'a>(value: &'a Value, segs: &[&str], out: &mut Vec<&'a Value>) {
    match segs.split_first() {
        None => out.push(value),
        Some((&EXPAND, rest)) => match value {
            Value::Map(map) => map.values().for_each(|v| expand(v, rest, out)),
            Value::List(list) => list.iter().for_each(|v| expand(v, rest, out)),
            _ => {}
        },
        Some((seg, rest)) => {
            if let Some(next) = path::child(value, seg) {
                expand(next, rest, out);
            }
        }
    }
}
