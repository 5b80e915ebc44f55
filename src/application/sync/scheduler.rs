//! Snapshot/delta cycle selection and execution.
//!
//! One call to [`SyncScheduler::run_cycle`] performs one synchronization pass:
//!
//! ```text
//! decide mode ─► fetch every kind (concurrently, each under a timeout)
//!                  │ all ok                       │ any error
//!                  ▼                              ▼
//!            validate + merge            leave cache and cursors,
//!            advance cursors             count failure, maybe force resync
//!            publish if non-empty
//! ```
//!
//! A snapshot is chosen when no snapshot has succeeded yet, when any tracked
//! cursor is at epoch, or when the last snapshot is older than the configured
//! interval. Snapshot need always wins over delta. Cursors are reset to epoch
//! before a snapshot is attempted, so a failed snapshot is retried as a
//! snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::RwLock;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use super::failure::FailureTracker;
use super::publisher::UpdatePublisher;
use crate::application::cache::entity::EntityCache;
use crate::domain::{ChangeSet, Cursor, EntityKind, SyncMode};
use crate::error::{Error, Result};
use crate::infrastructure::config::sync::SyncConfig;
use crate::port::{FeedBatch, FeedProvider, UpdateEvent};

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every kind was fetched and merged.
    Success,
    /// Nothing was merged.
    Failed {
        /// Error description.
        error: String,
        /// Whether this failure crossed the threshold and reset all cursors.
        forced_resync: bool,
    },
}

/// Record of one synchronization cycle.
#[derive(Debug, Clone)]
pub struct SyncCycleResult {
    /// Mode the cycle ran in.
    pub mode: SyncMode,
    /// Entities received per kind. Empty when the fetch failed.
    pub received: BTreeMap<EntityKind, usize>,
    /// Success or failure.
    pub outcome: CycleOutcome,
    /// Ids merged into the cache.
    pub changes: ChangeSet,
    /// Whether an update event was published.
    pub published: bool,
    /// Wall time spent in the cycle.
    pub duration: Duration,
}

impl SyncCycleResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == CycleOutcome::Success
    }

    #[must_use]
    pub fn forced_resync(&self) -> bool {
        matches!(
            self.outcome,
            CycleOutcome::Failed {
                forced_resync: true,
                ..
            }
        )
    }
}

/// Observable scheduler state, shared with the engine for `get_stats()`.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    /// Mode of the most recent cycle attempt.
    pub current_mode: Option<SyncMode>,
    /// Mode the next cycle will select.
    pub next_mode: SyncMode,
    /// Completion time of the last successful cycle.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Completion time of the last successful snapshot.
    pub last_snapshot_time: Option<DateTime<Utc>>,
    /// Current run of failed cycles.
    pub consecutive_failures: u32,
    /// Times the failure threshold reset all cursors.
    pub forced_resyncs: u64,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
    /// Timer ticks dropped because a cycle was still in flight.
    pub skipped_ticks: u64,
    /// Description of the most recent failure.
    pub last_error: Option<String>,
    /// Cursor per tracked kind.
    pub cursors: BTreeMap<EntityKind, Cursor>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            current_mode: None,
            next_mode: SyncMode::Snapshot,
            last_sync_time: None,
            last_snapshot_time: None,
            consecutive_failures: 0,
            forced_resyncs: 0,
            cycles_succeeded: 0,
            cycles_failed: 0,
            skipped_ticks: 0,
            last_error: None,
            cursors: BTreeMap::new(),
        }
    }
}

/// Decides and executes one synchronization cycle at a time.
pub struct SyncScheduler {
    config: SyncConfig,
    provider: Arc<dyn FeedProvider>,
    cache: Arc<EntityCache>,
    publisher: Arc<UpdatePublisher>,
    failures: FailureTracker,
    cursors: BTreeMap<EntityKind, Cursor>,
    last_snapshot: Option<Instant>,
    status: Arc<RwLock<SyncStatus>>,
}

impl SyncScheduler {
    /// Create a scheduler with epoch cursors for every configured kind.
    ///
    /// Repeated kinds are fetched once.
    pub fn new(
        mut config: SyncConfig,
        provider: Arc<dyn FeedProvider>,
        cache: Arc<EntityCache>,
        publisher: Arc<UpdatePublisher>,
    ) -> Self {
        let mut seen = BTreeSet::new();
        config.kinds.retain(|kind| seen.insert(*kind));

        let cursors = config
            .kinds
            .iter()
            .map(|kind| (*kind, Cursor::Epoch))
            .collect::<BTreeMap<_, _>>();
        let status = SyncStatus {
            cursors: cursors.clone(),
            ..SyncStatus::default()
        };

        Self {
            failures: FailureTracker::new(config.failure_threshold),
            config,
            provider,
            cache,
            publisher,
            cursors,
            last_snapshot: None,
            status: Arc::new(RwLock::new(status)),
        }
    }

    /// Shared handle to the scheduler's observable state.
    #[must_use]
    pub fn status(&self) -> Arc<RwLock<SyncStatus>> {
        Arc::clone(&self.status)
    }

    /// Current cursor for `kind` (epoch for untracked kinds).
    #[must_use]
    pub fn cursor(&self, kind: EntityKind) -> Cursor {
        self.cursors.get(&kind).copied().unwrap_or_default()
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.failures.consecutive_failures()
    }

    /// Mode the next cycle will run in.
    #[must_use]
    pub fn next_mode(&self) -> SyncMode {
        let snapshot_due = match self.last_snapshot {
            None => true,
            Some(at) => at.elapsed() > self.config.snapshot_interval(),
        };
        let cursor_reset = self
            .config
            .kinds
            .iter()
            .any(|kind| self.cursor(*kind).is_epoch());

        if snapshot_due || cursor_reset {
            SyncMode::Snapshot
        } else {
            SyncMode::Delta
        }
    }

    /// Run one synchronization cycle.
    ///
    /// Never returns an error: failures are recorded in the result, counted
    /// toward the failure threshold, and retried by the next cycle.
    pub async fn run_cycle(&mut self) -> SyncCycleResult {
        let started = Instant::now();
        let requested_at = Utc::now();
        let mode = self.next_mode();

        if mode == SyncMode::Snapshot {
            self.reset_cursors();
        }
        self.status.write().current_mode = Some(mode);

        debug!(
            mode = %mode,
            provider = self.provider.provider_name(),
            scope = %self.config.scope,
            "Starting sync cycle"
        );

        let mut received = BTreeMap::new();
        let merged = match self.fetch(mode).await {
            Ok(batches) => {
                for (kind, batch) in &batches {
                    *received.entry(*kind).or_insert(0) += batch.len();
                }
                self.merge(mode, batches, requested_at)
            }
            Err(e) => Err(e),
        };

        let result = match merged {
            Ok(changes) => self.on_success(mode, changes, received, started),
            Err(e) => self.on_failure(mode, &e, received, started),
        };

        self.refresh_status(&result);
        result
    }

    /// Issue one provider call per tracked kind, concurrently.
    async fn fetch(&self, mode: SyncMode) -> Result<Vec<(EntityKind, FeedBatch)>> {
        let request_timeout = self.config.request_timeout();
        let scope = &self.config.scope;

        let calls = self.config.kinds.iter().map(|&kind| {
            let cursor = self.cursor(kind);
            async move {
                let operation = match mode {
                    SyncMode::Snapshot => "fetch_all",
                    SyncMode::Delta => "fetch_changed_since",
                };
                let call = async {
                    match mode {
                        SyncMode::Snapshot => self.provider.fetch_all(kind, scope).await,
                        SyncMode::Delta => {
                            self.provider
                                .fetch_changed_since(kind, scope, &cursor)
                                .await
                        }
                    }
                };

                match timeout(request_timeout, call).await {
                    Ok(Ok(batch)) => {
                        debug!(kind = %kind, operation, count = batch.len(), "Fetched batch");
                        Ok((kind, batch))
                    }
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(Error::Timeout {
                        operation,
                        timeout_ms: self.config.request_timeout_ms,
                    }),
                }
            }
        });

        join_all(calls).await.into_iter().collect()
    }

    /// Merge fetched batches into the cache, then advance cursors.
    ///
    /// Cursors move only after the cache accepted every batch.
    fn merge(
        &mut self,
        mode: SyncMode,
        batches: Vec<(EntityKind, FeedBatch)>,
        requested_at: DateTime<Utc>,
    ) -> Result<ChangeSet> {
        let mut tokens = Vec::with_capacity(batches.len());
        let mut entities = Vec::with_capacity(batches.len());
        for (kind, batch) in batches {
            tokens.push((kind, batch.cursor));
            entities.push((kind, batch.entities));
        }

        let changes = self.cache.apply(mode, entities)?;

        // Local-clock fallback uses the request time so changes landing
        // while the request was in flight are fetched again next cycle.
        for (kind, token) in tokens {
            let candidate = token.unwrap_or(Cursor::At(requested_at));
            let cursor = self.cursors.entry(kind).or_default();
            *cursor = cursor.advance(candidate);
        }

        Ok(changes)
    }

    fn on_success(
        &mut self,
        mode: SyncMode,
        changes: ChangeSet,
        received: BTreeMap<EntityKind, usize>,
        started: Instant,
    ) -> SyncCycleResult {
        self.failures.record_success();
        if mode == SyncMode::Snapshot {
            self.last_snapshot = Some(Instant::now());
        }

        let published = if changes.is_empty() {
            false
        } else {
            self.publisher
                .publish(&UpdateEvent::new(mode, changes.clone()));
            true
        };

        let duration = started.elapsed();
        match mode {
            SyncMode::Snapshot => info!(
                changed = changes.len(),
                duration_ms = duration.as_millis() as u64,
                "Snapshot cycle complete"
            ),
            SyncMode::Delta => debug!(
                changed = changes.len(),
                duration_ms = duration.as_millis() as u64,
                "Delta cycle complete"
            ),
        }

        SyncCycleResult {
            mode,
            received,
            outcome: CycleOutcome::Success,
            changes,
            published,
            duration,
        }
    }

    fn on_failure(
        &mut self,
        mode: SyncMode,
        err: &Error,
        received: BTreeMap<EntityKind, usize>,
        started: Instant,
    ) -> SyncCycleResult {
        let forced_resync = self.failures.record_failure();
        if forced_resync {
            self.force_resync();
            error!(
                mode = %mode,
                error = %err,
                threshold = self.failures.threshold(),
                "Sync failure threshold reached, forcing full resync"
            );
        } else {
            warn!(
                mode = %mode,
                error = %err,
                transient = err.is_transient(),
                consecutive = self.failures.consecutive_failures(),
                "Sync cycle failed, will retry next tick"
            );
        }

        SyncCycleResult {
            mode,
            received,
            outcome: CycleOutcome::Failed {
                error: err.to_string(),
                forced_resync,
            },
            changes: ChangeSet::new(),
            published: false,
            duration: started.elapsed(),
        }
    }

    fn reset_cursors(&mut self) {
        for cursor in self.cursors.values_mut() {
            *cursor = Cursor::Epoch;
        }
    }

    /// Discard all delta trust: the next cycle must snapshot.
    fn force_resync(&mut self) {
        self.reset_cursors();
        self.last_snapshot = None;
    }

    fn refresh_status(&self, result: &SyncCycleResult) {
        let next_mode = self.next_mode();
        let mut status = self.status.write();
        match &result.outcome {
            CycleOutcome::Success => {
                let now = Utc::now();
                status.cycles_succeeded += 1;
                status.last_sync_time = Some(now);
                if result.mode == SyncMode::Snapshot {
                    status.last_snapshot_time = Some(now);
                }
            }
            CycleOutcome::Failed {
                error,
                forced_resync,
            } => {
                status.cycles_failed += 1;
                status.last_error = Some(error.clone());
                if *forced_resync {
                    status.forced_resyncs += 1;
                }
            }
        }
        status.consecutive_failures = self.failures.consecutive_failures();
        status.next_mode = next_mode;
        status.cursors = self.cursors.clone();
    }
}
