//! Auditing and analytics for store history

use chrono::{DateTime, Utc};
use statecraft_core::{DiffEntry, MutationKind, TransactionRecord};
use std::collections::{BTreeMap, HashMap};

/// Auditor for querying and analyzing transaction records
pub struct Auditor<'a> {
    records: &'a [TransactionRecord],
}

impl<'a> Auditor<'a> {
    /// Create a new auditor over a history
    pub fn new(records: &'a [TransactionRecord]) -> Self {
        Self { records }
    }

    /// Generate a comprehensive audit report
    pub fn generate_report(&self) -> AuditReport {
        let mut report = AuditReport {
            total_transactions: self.records.len(),
            first_timestamp: self.records.first().map(|r| r.timestamp),
            last_timestamp: self.records.last().map(|r| r.timestamp),
            ..Default::default()
        };

        for record in self.records {
            report.total_mutations += record.mutations.len();
            for mutation in &record.mutations {
                *report.mutation_kinds.entry(mutation.kind()).or_insert(0) += 1;
            }
            for entry in &record.diff.entries {
                report.total_entries += 1;
                if entry.is_added() {
                    report.added += 1;
                } else if entry.is_removed() {
                    report.removed += 1;
                } else {
                    report.modified += 1;
                }
                *report.path_changes.entry(entry.path.clone()).or_insert(0) += 1;
            }
        }

        report
    }

    /// Records matching the query
    pub fn query(&self, query: &AuditQuery) -> Vec<&'a TransactionRecord> {
        let records: &'a [TransactionRecord] = self.records;
        records
            .iter()
            .filter(|record| query.matches(record))
            .collect()
    }

    /// Every change to exactly `path`, oldest first
    pub fn changes_to(&self, path: &str) -> Vec<PathChange<'a>> {
        let records: &'a [TransactionRecord] = self.records;
        records
            .iter()
            .enumerate()
            .flat_map(|(index, record)| {
                record
                    .diff
                    .entries
                    .iter()
                    .filter(move |e| e.path == path)
                    .map(move |entry| PathChange {
                        record: index,
                        timestamp: record.timestamp,
                        entry,
                    })
            })
            .collect()
    }

    /// Paths ordered by how often they changed, most first
    pub fn hottest_paths(&self, limit: usize) -> Vec<(String, u64)> {
        let mut counts: Vec<_> = self.generate_report().path_changes.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(limit);
        counts
    }
}

/// One change to a single path
#[derive(Debug, Clone, Copy)]
pub struct PathChange<'a> {
    /// Index of the record in the history
    pub record: usize,
    pub timestamp: DateTime<Utc>,
    pub entry: &'a DiffEntry,
}

/// A comprehensive audit report
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    /// Number of committed transactions
    pub total_transactions: usize,
    /// Mutations across all transactions
    pub total_mutations: usize,
    /// Diff entries across all transactions
    pub total_entries: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    /// Timestamp of the oldest record
    pub first_timestamp: Option<DateTime<Utc>>,
    /// Timestamp of the newest record
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Change count per diff path
    pub path_changes: HashMap<String, u64>,
    /// Mutation count per kind
    pub mutation_kinds: BTreeMap<MutationKind, u64>,
}

impl std::fmt::Display for AuditReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Audit Report ===")?;
        writeln!(f, "Transactions: {}", self.total_transactions)?;
        writeln!(f, "Mutations: {}", self.total_mutations)?;
        writeln!(
            f,
            "Diff entries: {} (+{} -{} ~{})",
            self.total_entries, self.added, self.removed, self.modified
        )?;

        if let (Some(first), Some(last)) = (self.first_timestamp, self.last_timestamp) {
            writeln!(f, "Time range: {} - {}", first.to_rfc3339(), last.to_rfc3339())?;
        }

        if !self.mutation_kinds.is_empty() {
            writeln!(f, "\nMutations by kind:")?;
            for (kind, count) in &self.mutation_kinds {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        if !self.path_changes.is_empty() {
            writeln!(f, "\nChanges by path:")?;
            let mut sorted: Vec<_> = self.path_changes.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (path, count) in sorted {
                writeln!(f, "  {}: {}", path, count)?;
            }
        }

        Ok(())
    }
}

/// Query criteria for filtering transaction records
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Earliest timestamp (inclusive)
    pub since: Option<DateTime<Utc>>,
    /// Latest timestamp (inclusive)
    pub until: Option<DateTime<Utc>>,
    /// Only records with a diff entry at or below this path
    pub path_prefix: Option<String>,
    /// Only records containing a mutation of this kind
    pub mutation_kind: Option<MutationKind>,
}

impl AuditQuery {
    /// Create a new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by time range
    pub fn in_range(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Filter by changed path
    pub fn touching(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Filter by mutation kind
    pub fn by_kind(mut self, kind: MutationKind) -> Self {
        self.mutation_kind = Some(kind);
        self
    }

    fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(since) = self.since {
            if record.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.timestamp > until {
                return false;
            }
        }
        if let Some(kind) = self.mutation_kind {
            if !record.mutations.iter().any(|m| m.kind() == kind) {
                return false;
            }
        }
        if let Some(ref prefix) = self.path_prefix {
            if !record.diff.iter().any(|e| under(&e.path, prefix)) {
                return false;
            }
        }
        true
    }
}

fn under(path: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use statecraft_core::{push, remove_key, set, GameStore, ManualClock, StoreConfig, Value};
    use std::sync::Arc;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn recorded_store() -> GameStore {
        let clock = Arc::new(ManualClock::new(start()));
        let mut store = GameStore::with_clock(
            Value::map([
                ("turn", Value::from(1)),
                ("log", Value::list(Vec::<Value>::new())),
                (
                    "entities",
                    Value::map([("e1", Value::map([("stunned", true)]))]),
                ),
            ]),
            StoreConfig::default(),
            clock.clone(),
        );

        for turn in 2..5 {
            store.dispatch(vec![set("turn", turn), push("log", "tick")]);
            clock.advance(Duration::seconds(10));
        }
        store.dispatch(vec![remove_key("entities.e1", "stunned")]);
        store
    }

    #[test]
    fn test_generate_report() {
        let store = recorded_store();
        let report = Auditor::new(store.history()).generate_report();

        assert_eq!(report.total_transactions, 4);
        assert_eq!(report.total_mutations, 7);
        assert_eq!(report.total_entries, 7);
        assert_eq!(report.removed, 1);
        assert_eq!(report.modified, 6);
        assert_eq!(report.path_changes.get("turn"), Some(&3));
        assert_eq!(report.mutation_kinds.get(&MutationKind::Push), Some(&3));
        assert_eq!(report.first_timestamp, Some(start()));
        assert_eq!(report.last_timestamp, Some(start() + Duration::seconds(30)));

        let text = report.to_string();
        assert!(text.contains("Transactions: 4"));
        assert!(text.contains("remove_key: 1"));
    }

    #[test]
    fn test_query() {
        let store = recorded_store();
        let auditor = Auditor::new(store.history());

        assert_eq!(auditor.query(&AuditQuery::new().touching("entities")).len(), 1);
        assert_eq!(auditor.query(&AuditQuery::new().touching("ent")).len(), 0);
        assert_eq!(
            auditor.query(&AuditQuery::new().by_kind(MutationKind::Set)).len(),
            3
        );

        let window = AuditQuery::new().in_range(
            start() + Duration::seconds(5),
            start() + Duration::seconds(20),
        );
        assert_eq!(auditor.query(&window).len(), 2);
    }

    #[test]
    fn test_changes_to_path() {
        let store = recorded_store();
        let auditor = Auditor::new(store.history());

        let changes = auditor.changes_to("turn");
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[2].record, 2);
        assert_eq!(changes[2].entry.to, Some(Value::Int(4)));

        let hottest = auditor.hottest_paths(1);
        assert_eq!(hottest, vec![("log".to_string(), 3)]);
    }
}
