//! Runtime configuration for the reorder sync layer.
//!
//! Values can be set via environment variables:
//! - `KANBAN_DATA_DIR` - Optional. Project root for file storage. Defaults to the current directory.
//! - `KANBAN_REORDER_FAILURE_POLICY` - Optional. `keep`, `rollback`, or `refetch`. Defaults to `keep`.
//! - `KANBAN_NOTIFICATION_CAPACITY` - Optional. Notifications kept in history. Defaults to `32`.
//! - `KANBAN_LOG` - Optional. `tracing` filter directive. Defaults to `kanban_core=info`.

use crate::error::{KanbanError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// What to do with the optimistic cache when a reorder fails to persist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave the optimistic arrangement until the next reload
    #[default]
    Keep,
    /// Restore the arrangement from before the gesture
    Rollback,
    /// Reload the board from the store
    Refetch,
}

impl FromStr for FailurePolicy {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "rollback" => Ok(Self::Rollback),
            "refetch" => Ok(Self::Refetch),
            _ => Err(KanbanError::ConfigError(format!(
                "Invalid failure policy '{}'. Valid policies: keep, rollback, refetch",
                s
            ))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Rollback => write!(f, "rollback"),
            Self::Refetch => write!(f, "refetch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub failure_policy: FailurePolicy,
    pub data_dir: PathBuf,
    pub notification_capacity: usize,
    pub log_filter: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Keep,
            data_dir: PathBuf::from("."),
            notification_capacity: 32,
            log_filter: "kanban_core=info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("KANBAN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(policy) = lookup("KANBAN_REORDER_FAILURE_POLICY") {
            config.failure_policy = policy.parse()?;
        }
        if let Some(capacity) = lookup("KANBAN_NOTIFICATION_CAPACITY") {
            config.notification_capacity = capacity
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| {
                    KanbanError::ConfigError(format!(
                        "KANBAN_NOTIFICATION_CAPACITY must be a positive integer, got '{}'",
                        capacity
                    ))
                })?;
        }
        if let Some(filter) = lookup("KANBAN_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }
}
