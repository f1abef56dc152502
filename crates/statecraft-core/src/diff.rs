//! Structural diffing between two state trees
//!
//! Records are compared key by key and equal-length lists index by index.
//! Anything else (a list that changed length, a primitive, or a change of
//! kind) becomes a single entry at that path. Structurally equal subtrees
//! produce nothing.
//!
//! Entry order follows the traversal: keys of `before` in their order, then
//! keys that only exist in `after`. No entry path is a prefix of another,
//! so entries can be replayed in any order.

use crate::path::{self, MissingPathPolicy};
use crate::{MutationError, Value};
use serde::{Deserialize, Serialize};

/// A single changed path
///
/// `from == None` is an addition, `to == None` a removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: String,
    pub from: Option<Value>,
    pub to: Option<Value>,
}

impl DiffEntry {
    pub fn new(path: impl Into<String>, from: Option<Value>, to: Option<Value>) -> Self {
        Self {
            path: path.into(),
            from,
            to,
        }
    }

    pub fn is_added(&self) -> bool {
        self.from.is_none() && self.to.is_some()
    }

    pub fn is_removed(&self) -> bool {
        self.from.is_some() && self.to.is_none()
    }

    pub fn is_modified(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Path split into segments
    pub fn segments(&self) -> Vec<&str> {
        path::segments(&self.path)
    }
}

/// Ordered set of changes between two snapshots
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diff {
    pub entries: Vec<DiffEntry>,
}

impl Diff {
    /// A diff with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry> {
        self.entries.iter()
    }

    /// Rebuild the newer snapshot from the older one
    pub fn apply_forward(&self, before: &Value) -> Result<Value, MutationError> {
        let mut state = before.clone();
        for entry in &self.entries {
            write(&mut state, &entry.path, entry.to.as_ref())?;
        }
        Ok(state)
    }

    /// Rebuild the older snapshot from the newer one
    pub fn apply_backward(&self, after: &Value) -> Result<Value, MutationError> {
        let mut state = after.clone();
        for entry in &self.entries {
            write(&mut state, &entry.path, entry.from.as_ref())?;
        }
        Ok(state)
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn write(state: &mut Value, at: &str, value: Option<&Value>) -> Result<(), MutationError> {
    match value {
        Some(v) => path::set_at(state, at, v.clone(), MissingPathPolicy::Fail),
        None => path::remove_at(state, at).map(|_| ()),
    }
}

/// Compute the structural difference between two trees
pub fn compute_diff(before: &Value, after: &Value) -> Diff {
    let mut entries = Vec::new();
    diff_into("", before, after, &mut entries);
    Diff { entries }
}

fn diff_into(at: &str, before: &Value, after: &Value, out: &mut Vec<DiffEntry>) {
    match (before, after) {
        (Value::Map(old), Value::Map(new))
            if old.keys().chain(new.keys()).all(|k| path::is_addressable(at, k)) =>
        {
            for (key, old_value) in old {
                let child = path::join(at, key);
                match new.get(key) {
                    Some(new_value) => diff_into(&child, old_value, new_value, out),
                    None => out.push(DiffEntry::new(child, Some(old_value.clone()), None)),
                }
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    out.push(DiffEntry::new(
                        path::join(at, key),
                        None,
                        Some(new_value.clone()),
                    ));
                }
            }
        }
        (Value::List(old), Value::List(new)) if old.len() == new.len() => {
            for (i, (old_item, new_item)) in old.iter().zip(new).enumerate() {
                diff_into(&path::join(at, &i.to_string()), old_item, new_item, out);
            }
        }
        _ => {
            if !before.structurally_eq(after) {
                out.push(DiffEntry::new(
                    at,
                    Some(before.clone()),
                    Some(after.clone()),
                ));
            }
        }
    }
}
