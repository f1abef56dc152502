//! Error types for statecraft-core
//!
//! Typed errors are raised close to where they happen (path writes, RNG,
//! dice parsing, migrations). Anything crossing the `dispatch` boundary is
//! converted into a [`StoreError`], which carries a stable [`ErrorCode`]
//! plus enough context for both programmatic handling and diagnostics.

use crate::Value;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure raised while applying a mutation to the state tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("invalid path '{path}': segment '{segment}' does not exist")]
    InvalidPath { path: String, segment: String },

    #[error("target at '{path}' is not a sequence (found {found})")]
    NotASequence { path: String, found: &'static str },

    #[error("target at '{path}' is not a record (found {found})")]
    NotARecord { path: String, found: &'static str },

    #[error("index {index} out of range at '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("update at '{path}' rejected: {source}")]
    Rejected { path: String, source: StoreError },
}

/// Failure raised by the PRNG functions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RngError {
    #[error("invalid range: max ({max}) is less than min ({min})")]
    InvalidRange { min: i64, max: i64 },

    #[error("cannot pick from an empty collection")]
    EmptyCollection,

    #[error("weights must be non-negative with a positive total")]
    InvalidWeights,
}

/// Failure raised while parsing or rolling dice notation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiceError {
    #[error("empty dice notation")]
    Empty,

    #[error("invalid dice notation: {0}")]
    InvalidFormat(String),

    #[error("dice count must be at least 1")]
    InvalidCount,

    #[error("die must have at least 1 side")]
    InvalidSides,

    #[error("too many dice: {count} (at most {max})")]
    TooManyDice { count: u32, max: u32 },

    #[error("die has too many sides: {sides} (at most {max})")]
    TooManySides { sides: u32, max: u32 },
}

/// Failure raised while running schema migrations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrationError {
    #[error("duplicate migration for version {0}")]
    DuplicateVersion(u32),

    #[error("migration to version {version} failed: {reason}")]
    Failed { version: u32, reason: String },
}

/// Stable, machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    InvalidPath,
    NotASequence,
    NotARecord,
    IndexOutOfRange,
    InvalidRange,
    InvalidDiceNotation,
    MigrationFailed,
}

impl ErrorCode {
    /// Upper snake case name, stable across releases
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPath => "INVALID_PATH",
            ErrorCode::NotASequence => "NOT_A_SEQUENCE",
            ErrorCode::NotARecord => "NOT_A_RECORD",
            ErrorCode::IndexOutOfRange => "INDEX_OUT_OF_RANGE",
            ErrorCode::InvalidRange => "INVALID_RANGE",
            ErrorCode::InvalidDiceNotation => "INVALID_DICE_NOTATION",
            ErrorCode::MigrationFailed => "MIGRATION_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and why an error happened
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorContext {
    /// What was being attempted, e.g. `"set turn"`
    pub action: String,
    /// Why it failed
    pub reason: String,
    /// Optional relevant state (the value found at the failing path)
    pub state: Option<Value>,
    /// Optional hint for the developer
    pub suggestion: Option<String>,
}

/// Structured error returned across the store boundary
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[{code}] {message}")]
pub struct StoreError {
    pub code: ErrorCode,
    pub message: String,
    pub context: ErrorContext,
}

impl StoreError {
    /// Create an error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code,
            context: ErrorContext {
                reason: message.clone(),
                ..Default::default()
            },
            message,
        }
    }

    /// Set the action that was being attempted
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.context.action = action.into();
        self
    }

    /// Attach the state relevant to the failure
    pub fn with_state(mut self, state: Value) -> Self {
        self.context.state = Some(state);
        self
    }

    /// Attach a developer-facing hint
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestion = Some(suggestion.into());
        self
    }
}

impl From<MutationError> for StoreError {
    fn from(err: MutationError) -> Self {
        let (code, suggestion) = match &err {
            // Keep the caller's own code and hints
            MutationError::Rejected { source, .. } => return source.clone(),
            MutationError::InvalidPath { .. } => (
                ErrorCode::InvalidPath,
                "create the parent containers first or enable MissingPathPolicy::CreateRecords",
            ),
            MutationError::NotASequence { .. } => (
                ErrorCode::NotASequence,
                "push and remove_where only operate on lists",
            ),
            MutationError::NotARecord { .. } => (
                ErrorCode::NotARecord,
                "remove_key and keyed writes only operate on records",
            ),
            MutationError::IndexOutOfRange { .. } => (
                ErrorCode::IndexOutOfRange,
                "use push to append, or an index no greater than the list length",
            ),
        };
        StoreError::new(code, err.to_string()).with_suggestion(suggestion)
    }
}

impl From<RngError> for StoreError {
    fn from(err: RngError) -> Self {
        StoreError::new(ErrorCode::InvalidRange, err.to_string())
    }
}

impl From<DiceError> for StoreError {
    fn from(err: DiceError) -> Self {
        let suggestion = match err {
            DiceError::TooManyDice { .. } | DiceError::TooManySides { .. } => {
                "split the roll into several smaller notations"
            }
            _ => "use NdS, NdS+M or NdS-M, e.g. 2d6+3",
        };
        StoreError::new(ErrorCode::InvalidDiceNotation, err.to_string()).with_suggestion(suggestion)
    }
}

impl From<MigrationError> for StoreError {
    fn from(err: MigrationError) -> Self {
        StoreError::new(ErrorCode::MigrationFailed, err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_error_conversion() {
        let err: StoreError = MutationError::NotASequence {
            path: "turn".into(),
            found: "int",
        }
        .into();

        assert_eq!(err.code, ErrorCode::NotASequence);
        assert!(err.message.contains("turn"));
        assert_eq!(err.context.reason, err.message);
        assert!(err.context.suggestion.is_some());
    }

    #[test]
    fn test_rejection_keeps_inner_error() {
        let inner: StoreError = RngError::InvalidRange { min: 3, max: 1 }.into();
        let err: StoreError = MutationError::Rejected {
            path: "hp".into(),
            source: inner.clone(),
        }
        .into();
        assert_eq!(err, inner);
        assert_eq!(err.code, ErrorCode::InvalidRange);
    }

    #[test]
    fn test_dice_and_migration_conversion() {
        let err: StoreError = DiceError::TooManyDice { count: 5000, max: 1000 }.into();
        assert_eq!(err.code, ErrorCode::InvalidDiceNotation);
        assert!(err.context.suggestion.is_some());

        let err: StoreError = MigrationError::Failed {
            version: 2,
            reason: "missing field".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::MigrationFailed);
        assert!(err.message.contains("version 2"));
    }

    #[test]
    fn test_display_includes_code() {
        let err = StoreError::new(ErrorCode::InvalidRange, "max below min").with_action("roll");
        assert_eq!(err.to_string(), "[INVALID_RANGE] max below min");
        assert_eq!(err.context.action, "roll");
    }
}
