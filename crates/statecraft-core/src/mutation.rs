//! Mutation descriptors
//!
//! A [`Mutation`] names one path-scoped change. Builders never touch state;
//! the transaction engine applies them, in order, to its own working copy.

use crate::path::{self, MissingPathPolicy};
use crate::predicate::Predicate;
use crate::{MutationError, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which primitive a mutation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MutationKind {
    /// Replace or insert a value
    Set,
    /// Transform the existing value
    Update,
    /// Append to a list
    Push,
    /// Drop list elements matching a predicate
    RemoveWhere,
    /// Drop a key from a record
    RemoveKey,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Set => "set",
            MutationKind::Update => "update",
            MutationKind::Push => "push",
            MutationKind::RemoveWhere => "remove_where",
            MutationKind::RemoveKey => "remove_key",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type UpdateFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
type TryUpdateFn = Arc<dyn Fn(&Value) -> crate::Result<Value> + Send + Sync>;

#[derive(Clone)]
enum Op {
    Set(Value),
    Update(UpdateFn),
    TryUpdate(TryUpdateFn),
    Push(Value),
    RemoveWhere(Predicate),
    RemoveKey(String),
}

/// A single state change to run inside a transaction
#[derive(Clone)]
pub struct Mutation {
    kind: MutationKind,
    path: String,
    description: String,
    op: Op,
}

impl Mutation {
    fn new(kind: MutationKind, path: String, description: String, op: Op) -> Self {
        Self {
            kind,
            path,
            description,
            op,
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Path the mutation targets
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Human readable label, used as the error action
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the generated description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Apply this mutation to `state` in place
    ///
    /// On error `state` may be partially written; callers apply mutations
    /// to a scratch copy and discard it on failure.
    pub fn apply(&self, state: &mut Value, policy: MissingPathPolicy) -> Result<(), MutationError> {
        let at = self.path.as_str();
        match &self.op {
            Op::Set(value) => path::set_at(state, at, value.clone(), policy),
            Op::Update(f) => path::modify_at(state, at, policy, |current| {
                *current = f(current);
                Ok(())
            }),
            Op::TryUpdate(f) => path::modify_at(state, at, policy, |current| {
                *current = f(current).map_err(|source| MutationError::Rejected {
                    path: at.to_string(),
                    source,
                })?;
                Ok(())
            }),
            Op::Push(value) => path::modify_at(state, at, policy, |target| match target {
                Value::List(list) => {
                    list.push(value.clone());
                    Ok(())
                }
                other => Err(not_a_sequence(at, other)),
            }),
            Op::RemoveWhere(predicate) => {
                path::modify_at(state, at, policy, |target| match target {
                    Value::List(list) => {
                        list.retain(|item| !predicate.test(item));
                        Ok(())
                    }
                    other => Err(not_a_sequence(at, other)),
                })
            }
            Op::RemoveKey(key) => path::modify_at(state, at, policy, |target| match target {
                Value::Map(map) => {
                    map.shift_remove(key.as_str());
                    Ok(())
                }
                other => Err(MutationError::NotARecord {
                    path: at.to_string(),
                    found: other.type_name(),
                }),
            }),
        }
    }
}

fn not_a_sequence(path: &str, found: &Value) -> MutationError {
    MutationError::NotASequence {
        path: path.to_string(),
        found: found.type_name(),
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("description", &self.description)
            .finish()
    }
}

/// Replace or insert the value at `path`
pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Mutation {
    let path = path.into();
    let description = format!("set {}", path);
    Mutation::new(MutationKind::Set, path, description, Op::Set(value.into()))
}

/// Replace the existing value at `path` with `f(current)`
pub fn update<F>(path: impl Into<String>, f: F) -> Mutation
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    let path = path.into();
    let description = format!("update {}", path);
    Mutation::new(
        MutationKind::Update,
        path,
        description,
        Op::Update(Arc::new(f)),
    )
}

/// Like [`update`], but `f` may reject the current value
///
/// A rejection aborts the whole transaction and surfaces `f`'s error,
/// so typed failures (`?` on an [`RngError`](crate::RngError) or a
/// [`DiceError`](crate::DiceError)) reach the caller of `dispatch`.
pub fn try_update<F>(path: impl Into<String>, f: F) -> Mutation
where
    F: Fn(&Value) -> crate::Result<Value> + Send + Sync + 'static,
{
    let path = path.into();
    let description = format!("update {}", path);
    Mutation::new(
        MutationKind::Update,
        path,
        description,
        Op::TryUpdate(Arc::new(f)),
    )
}

/// Append `value` to the list at `path`
pub fn push(path: impl Into<String>, value: impl Into<Value>) -> Mutation {
    let path = path.into();
    let description = format!("push {}", path);
    Mutation::new(MutationKind::Push, path, description, Op::Push(value.into()))
}

/// Remove every element of the list at `path` that satisfies `predicate`
pub fn remove_where(path: impl Into<String>, predicate: Predicate) -> Mutation {
    let path = path.into();
    let description = format!("remove_where {}", path);
    Mutation::new(
        MutationKind::RemoveWhere,
        path,
        description,
        Op::RemoveWhere(predicate),
    )
}

/// Remove `key` from the record at `path`; a missing key is not an error
pub fn remove_key(path: impl Into<String>, key: impl Into<String>) -> Mutation {
    let path = path.into();
    let key = key.into();
    let description = format!("remove_key {} from {}", key, path);
    Mutation::new(MutationKind::RemoveKey, path, description, Op::RemoveKey(key))
}
