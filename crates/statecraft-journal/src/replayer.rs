//! Replay of recorded transactions

use crate::{Error, Result};
use statecraft_core::{TransactionRecord, Value};

/// State of the replayer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    /// At the starting state, nothing replayed
    Idle,
    /// Somewhere inside the history
    Paused,
    /// Every record has been replayed
    Finished,
}

/// Replayer for store history
///
/// Position `n` means the first `n` records have been applied. Moving
/// forward applies `diff.to` values, moving backward applies `diff.from`
/// values, so no snapshots are needed in either direction.
pub struct Replayer<'a> {
    records: &'a [TransactionRecord],
    start: Value,
    current: Value,
    position: usize,
}

impl<'a> Replayer<'a> {
    /// Replay from the state the first record was applied to
    pub fn new(initial: Value, records: &'a [TransactionRecord]) -> Self {
        Self {
            records,
            start: initial.clone(),
            current: initial,
            position: 0,
        }
    }

    /// Start at the end of history, from the latest state
    ///
    /// Useful when the initial state was not kept: stepping backward
    /// reconstructs it.
    pub fn from_latest(latest: Value, records: &'a [TransactionRecord]) -> Result<Self> {
        let mut start = latest.clone();
        for (record, entry) in records.iter().enumerate().rev() {
            start = entry
                .diff
                .apply_backward(&start)
                .map_err(|source| Error::Replay { record, source })?;
        }
        Ok(Self {
            records,
            start,
            current: latest,
            position: records.len(),
        })
    }

    /// Get the current state
    pub fn state(&self) -> ReplayState {
        if self.position == 0 {
            ReplayState::Idle
        } else if self.position == self.records.len() {
            ReplayState::Finished
        } else {
            ReplayState::Paused
        }
    }

    /// Number of records applied so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reconstructed state at the current position
    pub fn current(&self) -> &Value {
        &self.current
    }

    /// Record that the next `step_forward` will apply
    pub fn next_record(&self) -> Option<&'a TransactionRecord> {
        self.records.get(self.position)
    }

    /// Go to a specific position (`0..=len`)
    pub fn goto(&mut self, position: usize) -> Result<&Value> {
        if position > self.records.len() {
            return Err(Error::PositionOutOfRange {
                position,
                len: self.records.len(),
            });
        }
        while self.position < position {
            self.step_forward()?;
        }
        while self.position > position {
            self.step_backward()?;
        }
        Ok(&self.current)
    }

    /// Apply the next record; false when already at the end
    pub fn step_forward(&mut self) -> Result<bool> {
        let Some(record) = self.records.get(self.position) else {
            return Ok(false);
        };
        self.current = record
            .diff
            .apply_forward(&self.current)
            .map_err(|source| Error::Replay {
                record: self.position,
                source,
            })?;
        self.position += 1;
        tracing::trace!(position = self.position, "Stepped forward");
        Ok(true)
    }

    /// Undo the last applied record; false when already at the start
    pub fn step_backward(&mut self) -> Result<bool> {
        if self.position == 0 {
            return Ok(false);
        }
        let index = self.position - 1;
        self.current = self.records[index]
            .diff
            .apply_backward(&self.current)
            .map_err(|source| Error::Replay {
                record: index,
                source,
            })?;
        self.position = index;
        tracing::trace!(position = self.position, "Stepped backward");
        Ok(true)
    }

    /// Reset to the beginning
    pub fn reset(&mut self) {
        self.current = self.start.clone();
        self.position = 0;
    }
}
