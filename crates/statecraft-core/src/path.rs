//! Dot-separated path resolution and writes
//!
//! A path like `party.0.hp` is split on `.`. A segment addresses a list
//! element when the container is a list and the segment is a decimal
//! index; against a record it is always a key. The empty path addresses
//! the root. Keys containing `.`, and an empty key on the root record,
//! cannot be addressed; [`is_addressable`] tells them apart.

use crate::{MutationError, Value};
use serde::{Deserialize, Serialize};

/// What to do when a write walks through a missing intermediate container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingPathPolicy {
    /// Abort with [`MutationError::InvalidPath`]
    #[default]
    Fail,
    /// Create empty records for missing intermediate segments
    CreateRecords,
}

/// Split a path into its segments
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Append a segment to a path
pub fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

/// Whether `join(prefix, key)` names exactly that key
///
/// False for keys containing `.`, and for the empty key directly under
/// the root, whose joined path would address the root itself.
pub fn is_addressable(prefix: &str, key: &str) -> bool {
    !key.contains('.') && !(prefix.is_empty() && key.is_empty())
}

/// Resolve a single segment against a container
pub fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Map(map) => map.get(segment),
        Value::List(list) => segment.parse::<usize>().ok().and_then(|i| list.get(i)),
        _ => None,
    }
}

/// Resolve a path against a tree; `None` when any segment is missing
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    resolve_segments(root, &segments(path))
}

/// Resolve pre-split segments against a tree
pub fn resolve_segments<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    segs.iter().try_fold(root, |current, seg| child(current, seg))
}

fn parse_index(path: &str, segment: &str) -> Result<usize, MutationError> {
    segment
        .parse::<usize>()
        .map_err(|_| MutationError::InvalidPath {
            path: path.to_string(),
            segment: segment.to_string(),
        })
}

/// Walk to the container addressed by `segs`, creating records on the way
/// when the policy allows it
fn walk_mut<'a>(
    root: &'a mut Value,
    segs: &[&str],
    path: &str,
    policy: MissingPathPolicy,
) -> Result<&'a mut Value, MutationError> {
    let mut current = root;
    for seg in segs {
        current = match current {
            Value::Map(map) => {
                if !map.contains_key(*seg) {
                    if policy == MissingPathPolicy::CreateRecords {
                        map.insert(seg.to_string(), Value::empty_map());
                    } else {
                        return Err(MutationError::InvalidPath {
                            path: path.to_string(),
                            segment: seg.to_string(),
                        });
                    }
                }
                match map.get_mut(*seg) {
                    Some(next) => next,
                    None => {
                        return Err(MutationError::InvalidPath {
                            path: path.to_string(),
                            segment: seg.to_string(),
                        })
                    }
                }
            }
            Value::List(list) => {
                let index = parse_index(path, seg)?;
                let len = list.len();
                match list.get_mut(index) {
                    Some(next) => next,
                    None => {
                        return Err(MutationError::IndexOutOfRange {
                            path: path.to_string(),
                            index,
                            len,
                        })
                    }
                }
            }
            other => {
                return Err(MutationError::NotARecord {
                    path: path.to_string(),
                    found: other.type_name(),
                })
            }
        };
    }
    Ok(current)
}

/// Borrow the existing value at `path` mutably
pub fn target_mut<'a>(
    root: &'a mut Value,
    path: &str,
    policy: MissingPathPolicy,
) -> Result<&'a mut Value, MutationError> {
    let segs = segments(path);
    match segs.split_last() {
        None => Ok(root),
        Some((last, parents)) => {
            let parent = walk_mut(root, parents, path, policy)?;
            match parent {
                Value::Map(map) => map.get_mut(*last).ok_or_else(|| MutationError::InvalidPath {
                    path: path.to_string(),
                    segment: last.to_string(),
                }),
                Value::List(list) => {
                    let index = parse_index(path, last)?;
                    let len = list.len();
                    list.get_mut(index)
                        .ok_or_else(|| MutationError::IndexOutOfRange {
                            path: path.to_string(),
                            index,
                            len,
                        })
                }
                other => Err(MutationError::NotARecord {
                    path: path.to_string(),
                    found: other.type_name(),
                }),
            }
        }
    }
}

/// Edit the existing value at `path` in place
pub fn modify_at<F>(
    root: &mut Value,
    path: &str,
    policy: MissingPathPolicy,
    edit: F,
) -> Result<(), MutationError>
where
    F: FnOnce(&mut Value) -> Result<(), MutationError>,
{
    edit(target_mut(root, path, policy)?)
}

/// Write `value` at `path`
///
/// Record parents insert or replace the key in place. List parents replace
/// an existing index or append when the index equals the length.
pub fn set_at(
    root: &mut Value,
    path: &str,
    value: Value,
    policy: MissingPathPolicy,
) -> Result<(), MutationError> {
    let segs = segments(path);
    let Some((last, parents)) = segs.split_last() else {
        *root = value;
        return Ok(());
    };

    match walk_mut(root, parents, path, policy)? {
        Value::Map(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::List(list) => {
            let index = parse_index(path, last)?;
            if index < list.len() {
                list[index] = value;
                Ok(())
            } else if index == list.len() {
                list.push(value);
                Ok(())
            } else {
                Err(MutationError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: list.len(),
                })
            }
        }
        other => Err(MutationError::NotARecord {
            path: path.to_string(),
            found: other.type_name(),
        }),
    }
}

/// Remove whatever lives at `path`, returning it if it existed
pub fn remove_at(root: &mut Value, path: &str) -> Result<Option<Value>, MutationError> {
    let segs = segments(path);
    let Some((last, parents)) = segs.split_last() else {
        return Ok(Some(std::mem::take(root)));
    };

    match walk_mut(root, parents, path, MissingPathPolicy::Fail)? {
        Value::Map(map) => Ok(map.shift_remove(*last)),
        Value::List(list) => {
            let index = parse_index(path, last)?;
            if index < list.len() {
                Ok(Some(list.remove(index)))
            } else {
                Ok(None)
            }
        }
        other => Err(MutationError::NotARecord {
            path: path.to_string(),
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party() -> Value {
        Value::map([
            (
                "party",
                Value::list([
                    Value::map([("id", Value::from("alice")), ("hp", Value::from(20))]),
                    Value::map([("id", Value::from("bob")), ("hp", Value::from(15))]),
                ]),
            ),
            ("turn", Value::from(1)),
        ])
    }

    #[test]
    fn test_resolve() {
        let state = party();
        assert_eq!(resolve(&state, "turn"), Some(&Value::Int(1)));
        assert_eq!(resolve(&state, "party.1.hp"), Some(&Value::Int(15)));
        assert_eq!(resolve(&state, "party.2.hp"), None);
        assert_eq!(resolve(&state, "party.x"), None);
        assert_eq!(resolve(&state, "turn.deeper"), None);
        assert_eq!(resolve(&state, ""), Some(&state));
    }

    #[test]
    fn test_addressable_keys() {
        assert!(is_addressable("", "turn"));
        assert!(is_addressable("stats", ""));
        assert!(!is_addressable("", ""));
        assert!(!is_addressable("stats", "a.b"));
        assert_eq!(join("", ""), "");
    }

    #[test]
    fn test_numeric_segment_against_record_is_a_key() {
        let state = Value::map([("slots", Value::map([("0", Value::from("sword"))]))]);
        assert_eq!(resolve(&state, "slots.0"), Some(&Value::from("sword")));
    }

    #[test]
    fn test_set_at_strict_and_create() {
        let mut state = party();
        set_at(&mut state, "party.0.hp", Value::from(5), MissingPathPolicy::Fail).unwrap();
        assert_eq!(resolve(&state, "party.0.hp"), Some(&Value::Int(5)));

        let err = set_at(&mut state, "world.weather", Value::from("rain"), MissingPathPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, MutationError::InvalidPath { ref segment, .. } if segment == "world"));

        set_at(
            &mut state,
            "world.weather",
            Value::from("rain"),
            MissingPathPolicy::CreateRecords,
        )
        .unwrap();
        assert_eq!(resolve(&state, "world.weather"), Some(&Value::from("rain")));
    }

    #[test]
    fn test_set_at_list_bounds() {
        let mut state = party();
        set_at(&mut state, "party.2", Value::from("carol"), MissingPathPolicy::Fail).unwrap();
        assert_eq!(resolve(&state, "party.2"), Some(&Value::from("carol")));

        let err = set_at(&mut state, "party.9", Value::Null, MissingPathPolicy::Fail).unwrap_err();
        assert_eq!(
            err,
            MutationError::IndexOutOfRange {
                path: "party.9".into(),
                index: 9,
                len: 3
            }
        );
    }

    #[test]
    fn test_set_through_primitive_fails() {
        let mut state = party();
        let err = set_at(&mut state, "turn.x", Value::Null, MissingPathPolicy::CreateRecords)
            .unwrap_err();
        assert!(matches!(err, MutationError::NotARecord { found: "int", .. }));
    }

    #[test]
    fn test_modify_at_requires_target() {
        let mut state = party();
        modify_at(&mut state, "turn", MissingPathPolicy::Fail, |v| {
            *v = Value::from(2);
            Ok(())
        })
        .unwrap();
        assert_eq!(resolve(&state, "turn"), Some(&Value::Int(2)));

        let err = modify_at(&mut state, "round", MissingPathPolicy::Fail, |_| Ok(())).unwrap_err();
        assert!(matches!(err, MutationError::InvalidPath { .. }));
    }

    #[test]
    fn test_remove_at() {
        let mut state = party();
        assert_eq!(remove_at(&mut state, "turn").unwrap(), Some(Value::Int(1)));
        assert_eq!(remove_at(&mut state, "turn").unwrap(), None);
        assert!(resolve(&state, "turn").is_none());
    }
}
