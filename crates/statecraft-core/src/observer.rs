//! Pattern-based change subscriptions
//!
//! A pattern is a `.`-separated template. Each segment is either a literal
//! or [`WILDCARD`], which matches exactly one path segment. A pattern only
//! matches paths with the same number of segments, so `party.*.hp` matches
//! `party.0.hp` but never `party.0` or `party.0.stats.hp`.
//!
//! Callbacks run synchronously during [`ObserverRegistry::notify`] and
//! receive only shared borrows of the state. A callback cannot dispatch on
//! the store it observes: the store is mutably borrowed while it notifies.

use crate::diff::{Diff, DiffEntry};
use crate::{path, Value};
use std::fmt;

/// Pattern segment matching any single path segment
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
}

/// A parsed subscription pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = path::segments(pattern)
            .into_iter()
            .map(|seg| {
                if seg == WILDCARD {
                    Segment::Any
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();
        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    /// Whether `path` is addressed by this pattern
    pub fn matches(&self, path: &str) -> bool {
        let segs = path::segments(path);
        segs.len() == self.segments.len()
            && self.segments.iter().zip(&segs).all(|(p, s)| match p {
                Segment::Any => true,
                Segment::Literal(lit) => lit == s,
            })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Context handed to a callback alongside the new and old values
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent<'a> {
    /// Path of the entry that matched
    pub path: &'a str,
    /// The whole diff being delivered
    pub diff: &'a Diff,
    pub before: &'a Value,
    pub after: &'a Value,
}

/// Callback signature: `(to, from, event)`
pub type ObserverFn = Box<dyn FnMut(Option<&Value>, Option<&Value>, &ChangeEvent<'_>) + Send>;

/// Handle returned by [`ObserverRegistry::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct Registration {
    id: ObserverId,
    pattern: Pattern,
    callback: ObserverFn,
}

/// Registered observers, kept in registration order
#[derive(Default)]
pub struct ObserverRegistry {
    registrations: Vec<Registration>,
    next_id: u64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for diff entries matching `pattern`
    pub fn observe<F>(&mut self, pattern: &str, callback: F) -> ObserverId
    where
        F: FnMut(Option<&Value>, Option<&Value>, &ChangeEvent<'_>) + Send + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration {
            id,
            pattern: Pattern::parse(pattern),
            callback: Box::new(callback),
        });
        id
    }

    /// Remove one registration; false if it was already gone
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    /// Remove every registration
    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Patterns in registration order
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.registrations.iter().map(|r| &r.pattern)
    }

    /// Deliver `diff` to every matching callback
    ///
    /// Entries are visited in diff order and, for each entry, callbacks in
    /// registration order. Returns the number of callback invocations.
    pub fn notify(&mut self, before: &Value, after: &Value, diff: &Diff) -> usize {
        let mut calls = 0;
        for entry in &diff.entries {
            let DiffEntry { path, from, to } = entry;
            let event = ChangeEvent {
                path,
                diff,
                before,
                after,
            };
            for registration in &mut self.registrations {
                if registration.pattern.matches(path) {
                    (registration.callback)(to.as_ref(), from.as_ref(), &event);
                    calls += 1;
                }
            }
        }
        calls
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .finish()
    }
}
