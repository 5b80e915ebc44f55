//! Sync cadence and failure-escalation configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::{EntityKind, Scope};

/// Snapshot/delta polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Maximum age of the last successful snapshot before the next cycle is
    /// forced to snapshot (milliseconds).
    #[serde(default = "default_snapshot_interval_ms")]
    pub snapshot_interval_ms: u64,
    /// Timer period between cycles (milliseconds).
    #[serde(default = "default_delta_polling_interval_ms")]
    pub delta_polling_interval_ms: u64,
    /// Consecutive failed cycles before cursors are distrusted.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Upper bound for each provider call (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Provider-specific filter, e.g. a sport id.
    #[serde(default = "default_scope")]
    pub scope: Scope,
    /// Entity kinds to synchronize.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<EntityKind>,
}

fn default_snapshot_interval_ms() -> u64 {
    3_600_000 // 1 hour
}

fn default_delta_polling_interval_ms() -> u64 {
    5_000 // 5 seconds
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_request_timeout_ms() -> u64 {
    10_000 // 10 seconds
}

fn default_scope() -> Scope {
    Scope::new("29") // soccer
}

fn default_kinds() -> Vec<EntityKind> {
    EntityKind::ALL.to_vec()
}

impl SyncConfig {
    #[must_use]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    #[must_use]
    pub fn delta_polling_interval(&self) -> Duration {
        Duration::from_millis(self.delta_polling_interval_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_ms: default_snapshot_interval_ms(),
            delta_polling_interval_ms: default_delta_polling_interval_ms(),
            failure_threshold: default_failure_threshold(),
            request_timeout_ms: default_request_timeout_ms(),
            scope: default_scope(),
            kinds: default_kinds(),
        }
    }
}
