//! Statecraft Journal - Auditing, replay, and export of store history
//!
//! This crate works on the transaction records a `GameStore` keeps:
//!
//! - **Replayer**: Walk forwards and backwards through history by replaying diffs
//! - **Auditor**: Summarise and filter recorded transactions
//! - **Exporter**: Export history to RON, JSON or plain text
//!
//! # Example
//!
//! ```
//! use statecraft_core::{set, GameStore, Value};
//! use statecraft_journal::{Auditor, Exporter, Replayer};
//!
//! let initial = Value::map([("turn", 1)]);
//! let mut store = GameStore::new(initial.clone());
//! store.dispatch(vec![set("turn", 2)]);
//! store.dispatch(vec![set("turn", 3)]);
//!
//! // Rewind to the state after the first transaction
//! let mut replayer = Replayer::new(initial, store.history());
//! replayer.goto(1).unwrap();
//! assert_eq!(replayer.current().get_key("turn"), Some(&Value::Int(2)));
//!
//! // Summarise the session
//! let report = Auditor::new(store.history()).generate_report();
//! assert_eq!(report.total_transactions, 2);
//!
//! // Export for external analysis
//! let ron = Exporter::new(store.history()).to_ron().unwrap();
//! assert!(ron.contains("turn"));
//! ```

mod auditor;
mod error;
mod exporter;
mod replayer;

pub use auditor::{AuditQuery, AuditReport, Auditor, PathChange};
pub use error::{Error, Result};
pub use exporter::{ExportFormat, Exporter};
pub use replayer::{ReplayState, Replayer};

// Re-export the record types for convenience
pub use statecraft_core::{Diff, DiffEntry, MutationKind, TransactionRecord};
