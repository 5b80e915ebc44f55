//! Sync engine lifecycle (composition root).
//!
//! [`SyncEngine`] owns the cache and publisher for its whole life and builds a
//! fresh [`SyncScheduler`] on every `start()`. A background task ticks at the
//! delta polling interval; the first tick fires immediately.
//!
//! # Overlap policy
//!
//! At most one cycle is in flight. Each tick tries to take the scheduler lock
//! without waiting; if a cycle still holds it, the tick is skipped and counted
//! in `skipped_ticks`. Skipped ticks are not failures and are never queued.
//!
//! Timer ticks and [`SyncEngine::sync_now`] both run their cycle on a spawned
//! task whose abort handle is kept in a shared slot. `stop()` and drop close
//! the slot and abort whatever cycle it holds.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::publisher::{Subscription, UpdatePublisher};
use super::scheduler::{SyncCycleResult, SyncScheduler, SyncStatus};
use crate::application::cache::entity::EntityCache;
use crate::domain::{Cursor, EntityKind, SyncMode};
use crate::infrastructure::config::sync::SyncConfig;
use crate::port::{FeedProvider, UpdateSubscriber};

/// Read-only engine status.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub running: bool,
    /// Cached entities per kind.
    pub counts_by_kind: BTreeMap<EntityKind, usize>,
    /// Completion time of the last successful cycle.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Mode of the most recent cycle attempt.
    pub current_mode: Option<SyncMode>,
    /// Mode the next cycle will select.
    pub next_mode: SyncMode,
    pub last_snapshot_time: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    /// Times repeated failures forced a full resync.
    pub forced_resyncs: u64,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
    pub skipped_ticks: u64,
    pub last_error: Option<String>,
    pub cursors: BTreeMap<EntityKind, Cursor>,
}

/// Cycle currently in flight. No cycle starts once closed.
#[derive(Default)]
struct CycleSlot {
    current: Option<AbortHandle>,
    closed: bool,
}

impl CycleSlot {
    fn close(&mut self) {
        self.closed = true;
        if let Some(cycle) = self.current.take() {
            cycle.abort();
        }
    }
}

struct Running {
    scheduler: Arc<AsyncMutex<SyncScheduler>>,
    cycles: Arc<Mutex<CycleSlot>>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Long-running synchronization engine.
pub struct SyncEngine {
    config: SyncConfig,
    provider: Arc<dyn FeedProvider>,
    cache: Arc<EntityCache>,
    publisher: Arc<UpdatePublisher>,
    status: Mutex<Arc<RwLock<SyncStatus>>>,
    running: Mutex<Option<Running>>,
}

impl SyncEngine {
    /// Create a stopped engine with an empty cache.
    pub fn new(config: SyncConfig, provider: Arc<dyn FeedProvider>) -> Self {
        Self {
            config,
            provider,
            cache: Arc::new(EntityCache::new()),
            publisher: Arc::new(UpdatePublisher::new()),
            status: Mutex::new(Arc::new(RwLock::new(SyncStatus::default()))),
            running: Mutex::new(None),
        }
    }

    /// Start the background sync loop.
    ///
    /// Idempotent: does nothing while already running. Every start begins
    /// from an empty cache and epoch cursors. Must be called within a tokio
    /// runtime.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            debug!("Sync engine already running");
            return;
        }
        if let Some(stale) = running.take() {
            stale.cycles.lock().close();
        }

        self.cache.clear();
        let scheduler = SyncScheduler::new(
            self.config.clone(),
            Arc::clone(&self.provider),
            Arc::clone(&self.cache),
            Arc::clone(&self.publisher),
        );
        let status = scheduler.status();
        *self.status.lock() = Arc::clone(&status);

        let scheduler = Arc::new(AsyncMutex::new(scheduler));
        let cycles = Arc::new(Mutex::new(CycleSlot::default()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            Arc::clone(&scheduler),
            Arc::clone(&cycles),
            status,
            self.config.delta_polling_interval(),
            shutdown_rx,
        ));

        *running = Some(Running {
            scheduler,
            cycles,
            shutdown_tx,
            task,
        });

        info!(
            provider = self.provider.provider_name(),
            scope = %self.config.scope,
            poll_ms = self.config.delta_polling_interval_ms,
            snapshot_ms = self.config.snapshot_interval_ms,
            "Sync engine started"
        );
    }

    /// Stop the background loop and discard cached state.
    ///
    /// Idempotent and safe to call before `start()`. An in-flight cycle,
    /// whether started by the timer or by `sync_now()`, is cancelled at its
    /// provider call before anything is merged. Returns once no cycle holds
    /// the scheduler.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        let _ = running.shutdown_tx.send(true);
        if let Err(e) = running.task.await {
            if e.is_panic() {
                warn!(error = %e, "Sync loop panicked");
            }
        }

        running.cycles.lock().close();
        let _idle = running.scheduler.lock().await;

        self.cache.clear();
        info!("Sync engine stopped");
    }

    /// Run one cycle now, outside the timer.
    ///
    /// Returns `None` if the engine is stopped, a cycle is already in
    /// flight (the request counts as a skipped tick), or `stop()` cancelled
    /// the cycle.
    pub async fn sync_now(&self) -> Option<SyncCycleResult> {
        let (scheduler, cycles) = {
            let running = self.running.lock();
            let running = running.as_ref()?;
            (Arc::clone(&running.scheduler), Arc::clone(&running.cycles))
        };

        let Ok(guard) = scheduler.try_lock_owned() else {
            self.status.lock().write().skipped_ticks += 1;
            debug!("Sync cycle already in flight, skipping manual trigger");
            return None;
        };

        match spawn_cycle(guard, &cycles)?.await {
            Ok(result) => Some(result),
            Err(e) => {
                if e.is_panic() {
                    warn!(error = %e, "Manual sync cycle panicked");
                }
                None
            }
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// Register an update handler. Subscriptions survive restarts.
    pub fn subscribe(&self, subscriber: Arc<dyn UpdateSubscriber>) -> Subscription {
        self.publisher.subscribe(subscriber)
    }

    /// Shared read access to the cache.
    #[must_use]
    pub fn cache(&self) -> Arc<EntityCache> {
        Arc::clone(&self.cache)
    }

    #[must_use]
    pub fn publisher(&self) -> Arc<UpdatePublisher> {
        Arc::clone(&self.publisher)
    }

    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Snapshot of counts, timing and failure state.
    #[must_use]
    pub fn get_stats(&self) -> EngineStats {
        let status = self.status.lock().read().clone();
        EngineStats {
            running: self.is_running(),
            counts_by_kind: self.cache.counts(),
            last_sync_time: status.last_sync_time,
            current_mode: status.current_mode,
            next_mode: status.next_mode,
            last_snapshot_time: status.last_snapshot_time,
            consecutive_failures: status.consecutive_failures,
            forced_resyncs: status.forced_resyncs,
            cycles_succeeded: status.cycles_succeeded,
            cycles_failed: status.cycles_failed,
            skipped_ticks: status.skipped_ticks,
            last_error: status.last_error,
            cursors: status.cursors,
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.task.abort();
            running.cycles.lock().close();
        }
    }
}

/// Run one cycle on its own task and record it in `cycles`.
///
/// Returns `None` without running anything once the slot is closed.
fn spawn_cycle(
    mut guard: OwnedMutexGuard<SyncScheduler>,
    cycles: &Mutex<CycleSlot>,
) -> Option<JoinHandle<SyncCycleResult>> {
    let mut slot = cycles.lock();
    if slot.closed {
        return None;
    }
    let handle = tokio::spawn(async move { guard.run_cycle().await });
    slot.current = Some(handle.abort_handle());
    Some(handle)
}

/// Timer loop: one tick per polling interval, skipping ticks while busy.
async fn run_loop(
    scheduler: Arc<AsyncMutex<SyncScheduler>>,
    cycles: Arc<Mutex<CycleSlot>>,
    status: Arc<RwLock<SyncStatus>>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("Sync loop shutting down");
                break;
            }

            _ = ticker.tick() => {
                match Arc::clone(&scheduler).try_lock_owned() {
                    Ok(guard) => {
                        if spawn_cycle(guard, &cycles).is_none() {
                            break;
                        }
                    }
                    Err(_) => {
                        status.write().skipped_ticks += 1;
                        debug!("Previous sync cycle still running, skipping tick");
                    }
                }
            }
        }
    }
}
