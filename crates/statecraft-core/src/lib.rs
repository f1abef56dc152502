//! Statecraft Core - Reactive, transactional, in-memory state store
//!
//! This crate provides a single owned data tree that changes only through
//! atomic transactions:
//! - Dynamic value tree (`Value`, `ValueMap`) addressed by dot paths
//! - Mutation descriptors (`set`, `update`, `try_update`, `push`, `remove_where`,
//!   `remove_key`)
//! - All-or-nothing transactions that produce a structural `Diff`
//! - Pattern-based observers (`party.*.hp`) notified from diffs
//! - Path + predicate queries
//! - Deterministic, pure PRNG and dice notation
//! - Incrementally maintained component indexes
//! - Versioned migrations for saved state
//!
//! `GameStore` ties these together.
//!
//! ## Threading
//!
//! The store is synchronous and single-writer. Wrap it in a lock to share
//! it between threads. The PRNG functions are pure and can be used from
//! anywhere.

mod clock;
mod config;
pub mod dice;
pub mod diff;
mod error;
mod identity;
mod index;
mod migration;
pub mod mutation;
pub mod observer;
pub mod path;
pub mod predicate;
pub mod query;
pub mod rng;
mod store;
pub mod transaction;
mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use dice::{roll_dice, DiceNotation, DiceRoll};
pub use diff::{compute_diff, Diff, DiffEntry};
pub use error::{
    DiceError, ErrorCode, ErrorContext, MigrationError, MutationError, Result, RngError, StoreError,
};
pub use identity::{entity_id, generate_id, EntityId};
pub use index::{ComponentIndex, IndexUpdate};
pub use migration::{Migration, Migrator};
pub use mutation::{
    push, remove_key, remove_where, set, try_update, update, Mutation, MutationKind,
};
pub use observer::{ChangeEvent, ObserverId, ObserverRegistry, Pattern};
pub use path::MissingPathPolicy;
pub use predicate::{Point, Predicate};
pub use query::{FieldMatch, Filter};
pub use rng::{PrngState, Rng};
pub use store::{GameStore, TransactionRecord};
pub use transaction::{transaction, transaction_with, Effect, TransactionOptions, TransactionResult};
pub use value::{Value, ValueKind, ValueMap};

// Re-export IndexMap for building field filters and records
pub use indexmap::IndexMap;
