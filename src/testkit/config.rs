//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::infrastructure::config::sync::SyncConfig;

/// Sync config with a one-hour snapshot interval, one-second polling and a
/// short request timeout.
pub fn sync(failure_threshold: u32) -> SyncConfig {
    SyncConfig {
        snapshot_interval_ms: 3_600_000,
        delta_polling_interval_ms: 1_000,
        failure_threshold,
        request_timeout_ms: 500,
        ..SyncConfig::default()
    }
}
