//! Export store history to various formats

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use statecraft_core::{Diff, MutationKind, TransactionRecord, Value};
use std::io::Write;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RON format (Rust Object Notation)
    Ron,
    /// JSON format (requires serde_json feature)
    Json,
    /// Human-readable text format
    Text,
}

/// Exporter for store history
///
/// Mutation closures cannot be serialized, so mutations are exported by
/// kind, path and description. Diffs are exported in full.
pub struct Exporter<'a> {
    records: &'a [TransactionRecord],
}

impl<'a> Exporter<'a> {
    /// Create a new exporter
    pub fn new(records: &'a [TransactionRecord]) -> Self {
        Self { records }
    }

    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Ron => self.to_ron(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Export to RON format
    pub fn to_ron(&self) -> Result<String> {
        to_ron(&ExportData::from_records(self.records, 0))
    }

    /// Export to JSON format
    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String> {
        to_json(&ExportData::from_records(self.records, 0))
    }

    #[cfg(not(feature = "serde_json"))]
    pub fn to_json(&self) -> Result<String> {
        Err(Error::ExportError(
            "JSON export requires the 'serde_json' feature".to_string(),
        ))
    }

    /// Export to human-readable text format
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("=== History Export ===\n\n");
        output.push_str(&format!("Transactions: {}\n", self.records.len()));
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            output.push_str(&format!(
                "Time range: {} - {}\n",
                first.timestamp.to_rfc3339(),
                last.timestamp.to_rfc3339()
            ));
        }

        output.push_str("\n=== Records ===\n");

        for (index, record) in self.records.iter().enumerate() {
            output.push_str(&format!(
                "\n--- #{} at {} ---\n",
                index,
                record.timestamp.to_rfc3339()
            ));
            for mutation in &record.mutations {
                output.push_str(&format!("  > {}\n", mutation.description()));
            }
            for entry in &record.diff.entries {
                output.push_str(&format!(
                    "  {}: {} -> {}\n",
                    display_path(&entry.path),
                    display_side(entry.from.as_ref()),
                    display_side(entry.to.as_ref())
                ));
            }
        }

        output
    }

    /// Export only records in `start..end` (by index)
    pub fn export_range(&self, start: usize, end: usize, format: ExportFormat) -> Result<String> {
        if start > end || end > self.records.len() {
            return Err(Error::ExportError(format!(
                "invalid record range {}..{} (history has {} records)",
                start,
                end,
                self.records.len()
            )));
        }
        let filtered = ExportData::from_records(&self.records[start..end], start);

        match format {
            ExportFormat::Ron => to_ron(&filtered),
            #[cfg(feature = "serde_json")]
            ExportFormat::Json => to_json(&filtered),
            #[cfg(not(feature = "serde_json"))]
            ExportFormat::Json => Err(Error::ExportError(
                "JSON export requires the 'serde_json' feature".to_string(),
            )),
            ExportFormat::Text => Err(Error::ExportError(
                "Range export only supports RON and JSON".to_string(),
            )),
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

fn display_side(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_string(), Value::to_string)
}

fn to_ron<T: Serialize>(data: &T) -> Result<String> {
    ron::ser::to_string_pretty(data, ron::ser::PrettyConfig::default())
        .map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(feature = "serde_json")]
fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(|e| Error::Serialization(e.to_string()))
}

/// Data structure for history export
#[derive(Debug, Clone, Serialize)]
struct ExportData<'a> {
    version: u32,
    transaction_count: usize,
    records: Vec<ExportRecord<'a>>,
}

impl<'a> ExportData<'a> {
    fn from_records(records: &'a [TransactionRecord], first_index: usize) -> Self {
        Self {
            version: 1,
            transaction_count: records.len(),
            records: records
                .iter()
                .enumerate()
                .map(|(offset, record)| ExportRecord {
                    index: first_index + offset,
                    timestamp: record.timestamp,
                    mutations: record
                        .mutations
                        .iter()
                        .map(|m| ExportMutation {
                            kind: m.kind(),
                            path: m.path(),
                            description: m.description(),
                        })
                        .collect(),
                    diff: &record.diff,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ExportRecord<'a> {
    index: usize,
    timestamp: DateTime<Utc>,
    mutations: Vec<ExportMutation<'a>>,
    diff: &'a Diff,
}

#[derive(Debug, Clone, Serialize)]
struct ExportMutation<'a> {
    kind: MutationKind,
    path: &'a str,
    description: &'a str,
}
