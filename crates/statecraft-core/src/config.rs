//! Store configuration
//!
//! ```
//! use statecraft_core::{MissingPathPolicy, StoreConfig};
//!
//! let config = StoreConfig::from_ron("(missing_paths: CreateRecords, history_limit: Some(100))")
//!     .unwrap();
//! assert_eq!(config.missing_paths, MissingPathPolicy::CreateRecords);
//! assert!(config.record_history);
//! ```

use crate::path::MissingPathPolicy;
use serde::{Deserialize, Serialize};

/// Behaviour switches for a [`GameStore`](crate::GameStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How writes treat missing intermediate containers
    pub missing_paths: MissingPathPolicy,
    /// Maximum number of transaction records kept; oldest go first
    pub history_limit: Option<usize>,
    /// Whether successful dispatches are recorded at all
    pub record_history: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            missing_paths: MissingPathPolicy::Fail,
            history_limit: None,
            record_history: true,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from RON; omitted fields take their defaults
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Keep at most `limit` history records
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn with_missing_paths(mut self, policy: MissingPathPolicy) -> Self {
        self.missing_paths = policy;
        self
    }

    /// Disable history recording
    pub fn without_history(mut self) -> Self {
        self.record_history = false;
        self
    }
}
