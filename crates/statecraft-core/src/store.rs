//! GameStore - the composition root
//!
//! Holds the current state and threads every dispatch through the
//! transaction engine, the observer registry, the history and the
//! component indexes.
//!
//! # Snapshots
//!
//! State is kept behind an `Arc`. [`GameStore::get_state`] hands out a
//! clone of that `Arc`, which is O(1). A caller that wants to edit its
//! snapshot has to go through `Arc::make_mut`, which copies because the
//! store still holds a reference, so the store never sees the edit.
//!
//! # Re-entrancy
//!
//! `dispatch` takes `&mut self` and observer callbacks only receive shared
//! borrows of the values, so a callback cannot dispatch on the store that
//! is notifying it. Callbacks that need to react with a new transaction
//! should queue the mutations and dispatch them after `dispatch` returns.
//!
//! # Example
//!
//! ```
//! use statecraft_core::{set, GameStore, Value};
//!
//! let mut store = GameStore::new(Value::map([("turn", 1)]));
//! store.observe("turn", |to, from, _| {
//!     println!("turn {:?} -> {:?}", from, to);
//! });
//!
//! let result = store.dispatch(vec![set("turn", 2)]);
//! assert!(result.valid);
//! assert_eq!(store.get("turn"), Some(&Value::Int(2)));
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::diff::Diff;
use crate::identity::EntityId;
use crate::index::{ComponentIndex, IndexUpdate};
use crate::migration::Migrator;
use crate::mutation::Mutation;
use crate::observer::{ChangeEvent, ObserverId, ObserverRegistry};
use crate::predicate::Predicate;
use crate::query::{self, Filter};
use crate::transaction::{transaction_with, TransactionOptions, TransactionResult};
use crate::Value;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// One committed dispatch, kept for debugging and replay
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub mutations: Vec<Mutation>,
    pub diff: Diff,
}

/// Reactive, transactional state container
pub struct GameStore {
    state: Arc<Value>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    observers: ObserverRegistry,
    history: Vec<TransactionRecord>,
    indexes: Vec<ComponentIndex>,
}

impl GameStore {
    /// Create a store with default configuration
    pub fn new(initial: Value) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    pub fn with_config(initial: Value, config: StoreConfig) -> Self {
        Self::with_clock(initial, config, Arc::new(SystemClock::new()))
    }

    /// Create a store with an injected time source
    pub fn with_clock(initial: Value, config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(initial),
            config,
            clock,
            observers: ObserverRegistry::new(),
            history: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Apply `mutations` atomically
    ///
    /// On success the new state is installed, observers are notified,
    /// the transaction is recorded and component indexes are updated. On
    /// failure none of that happens and the result carries the error.
    pub fn dispatch(&mut self, mutations: Vec<Mutation>) -> TransactionResult {
        let options = TransactionOptions {
            missing_paths: self.config.missing_paths,
        };
        let result = transaction_with(&self.state, &mutations, options);

        if let Some(error) = &result.error {
            tracing::warn!(
                code = %error.code,
                action = %error.context.action,
                "Transaction aborted: {}",
                error.message
            );
            return result;
        }

        let before = std::mem::replace(&mut self.state, Arc::clone(&result.state));
        tracing::debug!(
            mutations = mutations.len(),
            entries = result.diff.len(),
            "Transaction committed"
        );

        if !result.diff.is_empty() {
            let calls = self.observers.notify(&before, &self.state, &result.diff);
            tracing::trace!(calls, "Observers notified");
            self.update_indexes(&result.diff);
        }

        self.record(mutations, result.diff.clone());
        result
    }

    fn record(&mut self, mutations: Vec<Mutation>, diff: Diff) {
        if !self.config.record_history {
            return;
        }
        self.history.push(TransactionRecord {
            timestamp: self.clock.now(),
            mutations,
            diff,
        });
        if let Some(limit) = self.config.history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
            }
        }
    }

    fn update_indexes(&mut self, diff: &Diff) {
        for index in &mut self.indexes {
            match index.apply_diff(diff, &self.state) {
                IndexUpdate::Rebuilt => {
                    tracing::debug!(collection = index.collection(), "Component index rebuilt")
                }
                IndexUpdate::Incremental { entities } => {
                    tracing::trace!(collection = index.collection(), entities, "Component index updated")
                }
                IndexUpdate::Unchanged => {}
            }
        }
    }

    /// Subscribe to diff entries matching `pattern`
    pub fn observe<F>(&mut self, pattern: &str, callback: F) -> ObserverId
    where
        F: FnMut(Option<&Value>, Option<&Value>, &ChangeEvent<'_>) + Send + 'static,
    {
        self.observers.observe(pattern, callback)
    }

    /// Remove one subscription
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    /// Value at `path` in the current state
    pub fn get(&self, path: &str) -> Option<&Value> {
        query::get(&self.state, path)
    }

    pub fn has(&self, path: &str, predicate: Option<&Predicate>) -> bool {
        query::has(&self.state, path, predicate)
    }

    pub fn query(&self, path: &str, filter: Option<&Filter>) -> Vec<&Value> {
        query::query(&self.state, path, filter)
    }

    /// Shared snapshot of the current state
    pub fn get_state(&self) -> Arc<Value> {
        Arc::clone(&self.state)
    }

    /// Install a new state without diffing or notifying
    ///
    /// Used when loading or migrating a save. Component indexes are
    /// rebuilt; history is left as is.
    pub fn replace_state(&mut self, state: Value) {
        tracing::debug!(indexes = self.indexes.len(), "State replaced");
        self.state = Arc::new(state);
        for index in &mut self.indexes {
            index.rebuild(&self.state);
        }
    }

    /// Migrate a saved payload and install it with [`replace_state`]
    ///
    /// Returns the version the payload was brought to. On failure the
    /// current state is kept.
    ///
    /// [`replace_state`]: GameStore::replace_state
    pub fn load_migrated(
        &mut self,
        data: Value,
        from_version: u32,
        migrator: &Migrator,
    ) -> crate::Result<u32> {
        let (migrated, version) = migrator.migrate(data, from_version)?;
        tracing::debug!(from_version, version, "Loaded migrated state");
        self.replace_state(migrated);
        Ok(version)
    }

    /// Committed transactions, oldest first
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Start indexing the entity collection at `collection_path`
    ///
    /// Enabling an already indexed path rescans it.
    pub fn enable_component_index(&mut self, collection_path: &str) {
        if let Some(index) = self
            .indexes
            .iter_mut()
            .find(|i| i.collection() == collection_path)
        {
            index.rebuild(&self.state);
            return;
        }
        let index = ComponentIndex::build(collection_path, &self.state);
        tracing::debug!(
            collection = collection_path,
            entities = index.entity_count(),
            "Component index enabled"
        );
        self.indexes.push(index);
    }

    /// Index for a specific collection
    pub fn component_index(&self, collection_path: &str) -> Option<&ComponentIndex> {
        self.indexes
            .iter()
            .find(|i| i.collection() == collection_path)
    }

    /// Entities holding `component` across every indexed collection
    ///
    /// With a single indexed collection this borrows the maintained set,
    /// an O(1) lookup. Several collections holding the component are
    /// merged into an owned set; use [`component_index`] to look one
    /// collection up without merging.
    ///
    /// [`component_index`]: GameStore::component_index
    pub fn entities_with_component(&self, component: &str) -> Cow<'_, BTreeSet<EntityId>> {
        let mut hits = self
            .indexes
            .iter()
            .filter_map(|index| index.entities_with(component));
        let Some(first) = hits.next() else {
            return Cow::Owned(BTreeSet::new());
        };
        let mut rest = hits.peekable();
        if rest.peek().is_none() {
            return Cow::Borrowed(first);
        }
        let mut merged = first.clone();
        for ids in rest {
            merged.extend(ids.iter().cloned());
        }
        Cow::Owned(merged)
    }
}

impl fmt::Debug for GameStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameStore")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("observers", &self.observers)
            .field("history", &self.history.len())
            .field("indexes", &self.indexes.len())
            .finish()
    }
}
