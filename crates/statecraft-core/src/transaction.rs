//! All-or-nothing application of mutation lists
//!
//! Mutations run in order against a private copy of the state. The first
//! failure discards the copy and the caller gets back the original state
//! untouched. On success the diff is computed once, between the original
//! and the final state, so several mutations touching the same path
//! collapse into a single net entry.

use crate::diff::{compute_diff, Diff};
use crate::mutation::Mutation;
use crate::path::{self, MissingPathPolicy};
use crate::{StoreError, Value};
use serde::Serialize;
use std::sync::Arc;

/// Side effects requested by a transaction
///
/// Reserved: no transaction produces effects yet, so `effects` is always
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Effect {}

/// Knobs for a single transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub missing_paths: MissingPathPolicy,
}

/// Outcome of [`transaction`]
#[derive(Debug, Clone)]
pub struct TransactionResult {
    /// New state on success, the original state on failure
    pub state: Arc<Value>,
    /// Net changes; empty on failure
    pub diff: Diff,
    pub effects: Vec<Effect>,
    pub valid: bool,
    pub error: Option<StoreError>,
}

impl TransactionResult {
    fn committed(state: Arc<Value>, diff: Diff) -> Self {
        Self {
            state,
            diff,
            effects: Vec::new(),
            valid: true,
            error: None,
        }
    }

    fn aborted(state: Arc<Value>, error: StoreError) -> Self {
        Self {
            state,
            diff: Diff::empty(),
            effects: Vec::new(),
            valid: false,
            error: Some(error),
        }
    }
}

/// Apply `mutations` to `state` with default options
pub fn transaction(state: &Arc<Value>, mutations: &[Mutation]) -> TransactionResult {
    transaction_with(state, mutations, TransactionOptions::default())
}

/// Apply `mutations` to `state`
///
/// When nothing changes the returned state is the same `Arc` as the input.
pub fn transaction_with(
    state: &Arc<Value>,
    mutations: &[Mutation],
    options: TransactionOptions,
) -> TransactionResult {
    if mutations.is_empty() {
        return TransactionResult::committed(Arc::clone(state), Diff::empty());
    }

    let mut working = Value::clone(state);
    for mutation in mutations {
        if let Err(err) = mutation.apply(&mut working, options.missing_paths) {
            let found = path::resolve(&working, mutation.path()).cloned();
            let mut error = StoreError::from(err).with_action(mutation.description());
            if let Some(value) = found {
                error = error.with_state(value);
            }
            return TransactionResult::aborted(Arc::clone(state), error);
        }
    }

    let diff = compute_diff(state, &working);
    if diff.is_empty() {
        return TransactionResult::committed(Arc::clone(state), diff);
    }
    TransactionResult::committed(Arc::new(working), diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEntry;
    use crate::dice::roll_dice;
    use crate::mutation::{push, set, try_update, update};
    use crate::rng::{random_int, seed};
    use crate::ErrorCode;

    fn initial() -> Arc<Value> {
        Arc::new(Value::map([
            (
                "party",
                Value::list([
                    Value::map([("id", Value::from("alice")), ("hp", Value::from(20))]),
                    Value::map([("id", Value::from("bob")), ("hp", Value::from(15))]),
                ]),
            ),
            ("turn", Value::from(1)),
        ]))
    }

    #[test]
    fn test_empty_mutation_list_is_identity() {
        let state = initial();
        let result = transaction(&state, &[]);
        assert!(result.valid);
        assert!(result.diff.is_empty());
        assert!(result.effects.is_empty());
        assert!(result.error.is_none());
        assert!(Arc::ptr_eq(&result.state, &state));
    }

    #[test]
    fn test_same_path_coalesces() {
        let state = initial();
        let result = transaction(&state, &[set("turn", 2), set("turn", 3)]);
        assert!(result.valid);
        assert_eq!(
            result.diff.entries,
            vec![DiffEntry::new("turn", Some(Value::Int(1)), Some(Value::Int(3)))]
        );
    }

    #[test]
    fn test_transient_change_leaves_no_trace() {
        let state = initial();
        let result = transaction(&state, &[set("turn", 9), set("turn", 1)]);
        assert!(result.valid);
        assert!(result.diff.is_empty());
        assert!(Arc::ptr_eq(&result.state, &state));
    }

    #[test]
    fn test_failure_is_atomic() {
        let state = initial();
        let result = transaction(
            &state,
            &[
                set("turn", 2),
                update("party.0.hp", |hp| Value::from(hp.as_int().unwrap_or(0) - 5)),
                push("turn", "oops"),
            ],
        );

        assert!(!result.valid);
        assert!(result.diff.is_empty());
        assert!(Arc::ptr_eq(&result.state, &state));
        assert_eq!(path::resolve(&result.state, "turn"), Some(&Value::Int(1)));

        let error = result.error.expect("error");
        assert_eq!(error.code, ErrorCode::NotASequence);
        assert_eq!(error.context.action, "push turn");
        // The value found at the failing path in the working copy
        assert_eq!(error.context.state, Some(Value::Int(2)));
    }

    #[test]
    fn test_rejected_update_aborts_transaction() {
        let state = initial();
        let result = transaction(
            &state,
            &[
                set("turn", 2),
                try_update("party.0.hp", |hp| {
                    let (damage, _) = roll_dice(seed(1), "0d6")?;
                    Ok(Value::from(hp.as_int().unwrap_or(0) - damage))
                }),
            ],
        );

        assert!(!result.valid);
        assert!(result.diff.is_empty());
        assert!(Arc::ptr_eq(&result.state, &state));
        let error = result.error.expect("error");
        assert_eq!(error.code, ErrorCode::InvalidDiceNotation);
        assert_eq!(error.context.action, "update party.0.hp");
        assert_eq!(error.context.state, Some(Value::Int(20)));
        assert!(error.context.suggestion.is_some());

        // Healing past a cap below the current hp is an empty range
        let result = transaction(
            &state,
            &[
                try_update("party.1.hp", |hp| {
                    let hp = hp.as_int().unwrap_or(0);
                    let (heal, _) = random_int(seed(7), 1, 10 - hp)?;
                    Ok(Value::from(hp + heal))
                }),
                set("turn", 3),
            ],
        );
        assert!(Arc::ptr_eq(&result.state, &state));
        assert_eq!(result.error.map(|e| e.code), Some(ErrorCode::InvalidRange));

        let result = transaction(
            &state,
            &[try_update("party.0.hp", |hp| {
                let (damage, _) = roll_dice(seed(1), "1d4")?;
                Ok(Value::from(hp.as_int().unwrap_or(0) - damage))
            })],
        );
        assert!(result.valid);
        assert_eq!(result.diff.len(), 1);
        assert_eq!(result.diff.entries[0].path, "party.0.hp");
    }

    #[test]
    fn test_missing_path_policy() {
        let state = initial();
        let strict = transaction(&state, &[set("world.weather", "rain")]);
        assert_eq!(strict.error.map(|e| e.code), Some(ErrorCode::InvalidPath));

        let lenient = transaction_with(
            &state,
            &[set("world.weather", "rain")],
            TransactionOptions {
                missing_paths: MissingPathPolicy::CreateRecords,
            },
        );
        assert!(lenient.valid);
        assert_eq!(lenient.diff.len(), 1);
        assert_eq!(lenient.diff.entries[0].path, "world");
        assert!(lenient.diff.entries[0].is_added());
    }
}
