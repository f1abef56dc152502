//! Schema migrations for saved state
//!
//! The persistence layer owns save files and their envelopes. This module
//! only defines how versioned transforms are ordered and chained: each
//! [`Migration`] turns data shaped for `version - 1` into data shaped for
//! `version`, and [`Migrator`] runs every migration newer than the saved
//! version in ascending order.

use crate::{MigrationError, Value};
use std::fmt;
use std::sync::Arc;

type UpFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// One versioned transform
#[derive(Clone)]
pub struct Migration {
    pub version: u32,
    pub description: String,
    up: UpFn,
}

impl Migration {
    /// A migration that cannot fail
    pub fn new<F>(version: u32, description: impl Into<String>, up: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::fallible(version, description, move |data| Ok(up(data)))
    }

    /// A migration that may reject the data it is given
    pub fn fallible<F>(version: u32, description: impl Into<String>, up: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            version,
            description: description.into(),
            up: Arc::new(up),
        }
    }

    /// Run the transform
    pub fn up(&self, data: Value) -> Result<Value, MigrationError> {
        (self.up)(data).map_err(|reason| MigrationError::Failed {
            version: self.version,
            reason,
        })
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish()
    }
}

/// An ordered chain of migrations
#[derive(Debug, Clone, Default)]
pub struct Migrator {
    migrations: Vec<Migration>,
}

impl Migrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an unordered list, rejecting duplicate versions
    pub fn from_migrations(
        migrations: impl IntoIterator<Item = Migration>,
    ) -> Result<Self, MigrationError> {
        let mut migrator = Self::new();
        for migration in migrations {
            migrator.register(migration)?;
        }
        Ok(migrator)
    }

    /// Add a migration, keeping the chain sorted by version
    pub fn register(&mut self, migration: Migration) -> Result<(), MigrationError> {
        match self
            .migrations
            .binary_search_by_key(&migration.version, |m| m.version)
        {
            Ok(_) => Err(MigrationError::DuplicateVersion(migration.version)),
            Err(pos) => {
                self.migrations.insert(pos, migration);
                Ok(())
            }
        }
    }

    /// Highest version reachable, or `None` when empty
    pub fn latest_version(&self) -> Option<u32> {
        self.migrations.last().map(|m| m.version)
    }

    /// Migrations in the order they run
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Bring `data` saved at `from_version` up to the latest version
    ///
    /// Returns the migrated data and the version it now matches. Data that
    /// is already current comes back unchanged with `from_version`.
    pub fn migrate(&self, data: Value, from_version: u32) -> Result<(Value, u32), MigrationError> {
        let mut data = data;
        let mut version = from_version;
        for migration in self.migrations.iter().filter(|m| m.version > from_version) {
            tracing::debug!(
                from = version,
                to = migration.version,
                description = %migration.description,
                "Applying migration"
            );
            data = migration.up(data)?;
            version = migration.version;
        }
        Ok((data, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{self, MissingPathPolicy};

    fn chain() -> Migrator {
        Migrator::from_migrations([
            Migration::new(3, "rename gold to coins", |mut data| {
                if let Ok(Some(gold)) = path::remove_at(&mut data, "gold") {
                    let _ = path::set_at(&mut data, "coins", gold, MissingPathPolicy::Fail);
                }
                data
            }),
            Migration::new(2, "add turn counter", |mut data| {
                let _ = path::set_at(&mut data, "turn", Value::from(1), MissingPathPolicy::Fail);
                data
            }),
        ])
        .unwrap()
    }

    #[test]
    fn test_runs_in_ascending_order() {
        let migrator = chain();
        assert_eq!(migrator.latest_version(), Some(3));
        assert_eq!(migrator.migrations()[0].version, 2);

        let (data, version) = migrator.migrate(Value::map([("gold", 10)]), 1).unwrap();
        assert_eq!(version, 3);
        assert_eq!(data, Value::map([("turn", 1), ("coins", 10)]));
    }

    #[test]
    fn test_skips_applied_versions() {
        let migrator = chain();
        let (data, version) = migrator
            .migrate(Value::map([("turn", 4), ("gold", 2)]), 2)
            .unwrap();
        assert_eq!(version, 3);
        assert_eq!(data, Value::map([("turn", 4), ("coins", 2)]));

        let current = Value::map([("coins", 1)]);
        assert_eq!(migrator.migrate(current.clone(), 3).unwrap(), (current, 3));
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let err = Migrator::from_migrations([
            Migration::new(2, "a", |d| d),
            Migration::new(2, "b", |d| d),
        ])
        .unwrap_err();
        assert_eq!(err, MigrationError::DuplicateVersion(2));
    }

    #[test]
    fn test_failure_reports_version() {
        let migrator = Migrator::from_migrations([Migration::fallible(5, "require record", |d| {
            if d.as_map().is_some() {
                Ok(d)
            } else {
                Err("save root is not a record".to_string())
            }
        })])
        .unwrap();

        let err = migrator.migrate(Value::Int(1), 4).unwrap_err();
        assert_eq!(
            err,
            MigrationError::Failed {
                version: 5,
                reason: "save root is not a record".into()
            }
        );
    }
}
