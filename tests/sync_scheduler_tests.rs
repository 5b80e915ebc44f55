//! Cycle-level behavior of the sync scheduler.

mod support;

use std::sync::Arc;
use std::time::Duration;

use oddsync::application::cache::EntityCache;
use oddsync::application::sync::{SyncScheduler, UpdatePublisher};
use oddsync::domain::{Cursor, EntityId, EntityKind, SyncMode};
use oddsync::port::FeedBatch;
use oddsync::testkit::config;
use oddsync::testkit::domain::{fixture, make_fixtures, make_quotes, quote};
use oddsync::testkit::provider::{ProviderCall, ScriptedProvider};

use support::recording::RecordingSubscriber;

struct Harness {
    provider: Arc<ScriptedProvider>,
    cache: Arc<EntityCache>,
    events: Arc<RecordingSubscriber>,
    scheduler: SyncScheduler,
}

fn harness(failure_threshold: u32) -> Harness {
    harness_with(config::sync(failure_threshold))
}

fn harness_with(config: oddsync::infrastructure::config::sync::SyncConfig) -> Harness {
    let provider = Arc::new(ScriptedProvider::new());
    let cache = Arc::new(EntityCache::new());
    let publisher = Arc::new(UpdatePublisher::new());
    let events = RecordingSubscriber::new();
    let _subscription = publisher.subscribe(events.clone());

    let scheduler = SyncScheduler::new(config, provider.clone(), cache.clone(), publisher);
    Harness {
        provider,
        cache,
        events,
        scheduler,
    }
}

fn token_batch(token: i64) -> FeedBatch {
    FeedBatch::default().with_cursor(Cursor::Token(token))
}

#[tokio::test]
async fn example_scenario_cold_start_deltas_then_forced_resync() {
    let mut h = harness(3);
    h.provider.push_ok(EntityKind::Fixture, make_fixtures(3));
    h.provider.push_ok(EntityKind::Quote, make_quotes(3));

    // Cold start: snapshot with every id reported as changed.
    let first = h.scheduler.run_cycle().await;
    assert!(first.is_success());
    assert_eq!(first.mode, SyncMode::Snapshot);
    assert!(first.published);
    assert_eq!(h.events.count(), 1);
    let event = h.events.last().unwrap();
    assert_eq!(event.mode, SyncMode::Snapshot);
    assert_eq!(event.changed.len(), 6);
    assert_eq!(h.cache.size(EntityKind::Fixture), 3);
    assert_eq!(h.cache.size(EntityKind::Quote), 3);

    // Five empty deltas: no publish, cursors advance every time.
    for token in 1..=5 {
        h.provider.push_batch(EntityKind::Fixture, token_batch(token));
        h.provider.push_batch(EntityKind::Quote, token_batch(token));

        let result = h.scheduler.run_cycle().await;
        assert!(result.is_success());
        assert_eq!(result.mode, SyncMode::Delta);
        assert!(!result.published);
        assert_eq!(h.scheduler.cursor(EntityKind::Fixture), Cursor::Token(token));
        assert_eq!(h.scheduler.cursor(EntityKind::Quote), Cursor::Token(token));
    }
    assert_eq!(h.events.count(), 1);

    // Three failures in a row trip the threshold.
    for attempt in 1..=3 {
        h.provider.push_err(EntityKind::Fixture, "upstream down");
        let result = h.scheduler.run_cycle().await;
        assert!(!result.is_success());
        assert_eq!(result.mode, SyncMode::Delta);
        assert_eq!(result.forced_resync(), attempt == 3);
    }
    assert_eq!(h.scheduler.consecutive_failures(), 0);
    assert_eq!(h.scheduler.next_mode(), SyncMode::Snapshot);
    assert_eq!(h.scheduler.cursor(EntityKind::Fixture), Cursor::Epoch);

    // Forced snapshot even though the last snapshot is recent.
    h.provider.push_ok(EntityKind::Fixture, make_fixtures(2));
    let resync = h.scheduler.run_cycle().await;
    assert!(resync.is_success());
    assert_eq!(resync.mode, SyncMode::Snapshot);
    assert_eq!(h.cache.size(EntityKind::Fixture), 2);
    assert_eq!(h.cache.size(EntityKind::Quote), 0);
    assert_eq!(h.provider.fetch_all_count(), 4);

    let status = h.scheduler.status().read().clone();
    assert_eq!(status.forced_resyncs, 1);
    assert_eq!(status.cycles_failed, 3);
    assert_eq!(status.cycles_succeeded, 7);
}

#[tokio::test]
async fn delta_passes_current_cursor_to_provider() {
    let mut h = harness(3);
    h.provider
        .push_batch(EntityKind::Fixture, FeedBatch::new(make_fixtures(1)).with_cursor(Cursor::Token(40)));
    h.scheduler.run_cycle().await;

    h.scheduler.run_cycle().await;

    assert!(h
        .provider
        .calls()
        .contains(&ProviderCall::FetchChangedSince(EntityKind::Fixture, Cursor::Token(40))));
}

#[tokio::test]
async fn cursor_never_moves_backwards_on_success() {
    let mut h = harness(3);
    h.provider.push_batch(EntityKind::Fixture, token_batch(10));
    h.scheduler.run_cycle().await;
    assert_eq!(h.scheduler.cursor(EntityKind::Fixture), Cursor::Token(10));

    h.provider.push_batch(EntityKind::Fixture, token_batch(7));
    let result = h.scheduler.run_cycle().await;
    assert!(result.is_success());
    assert_eq!(h.scheduler.cursor(EntityKind::Fixture), Cursor::Token(10));
}

#[tokio::test]
async fn clock_cursor_used_without_provider_token() {
    let mut h = harness(3);
    h.scheduler.run_cycle().await;

    assert!(matches!(
        h.scheduler.cursor(EntityKind::Fixture),
        Cursor::At(_)
    ));
    assert_eq!(h.scheduler.next_mode(), SyncMode::Delta);
}

#[tokio::test]
async fn failed_delta_leaves_cache_and_cursors_untouched() {
    let mut h = harness(5);
    h.provider.push_batch(
        EntityKind::Fixture,
        FeedBatch::new(make_fixtures(2)).with_cursor(Cursor::Token(3)),
    );
    h.provider.push_batch(
        EntityKind::Quote,
        FeedBatch::new(make_quotes(2)).with_cursor(Cursor::Token(3)),
    );
    h.scheduler.run_cycle().await;

    let fixtures_before = h.cache.snapshot(EntityKind::Fixture);
    let quotes_before = h.cache.snapshot(EntityKind::Quote);

    // Fixtures succeed, quotes fail: nothing from the cycle is kept.
    h.provider.push_batch(
        EntityKind::Fixture,
        FeedBatch::new(vec![fixture("late")]).with_cursor(Cursor::Token(9)),
    );
    h.provider.push_err(EntityKind::Quote, "boom");
    let result = h.scheduler.run_cycle().await;

    assert!(!result.is_success());
    assert!(Arc::ptr_eq(&fixtures_before, &h.cache.snapshot(EntityKind::Fixture)));
    assert!(Arc::ptr_eq(&quotes_before, &h.cache.snapshot(EntityKind::Quote)));
    assert_eq!(h.scheduler.cursor(EntityKind::Fixture), Cursor::Token(3));
    assert_eq!(h.scheduler.cursor(EntityKind::Quote), Cursor::Token(3));
    assert_eq!(h.events.count(), 1);
}

#[tokio::test]
async fn malformed_entity_rejects_whole_cycle() {
    let mut h = harness(3);
    h.provider.push_ok(EntityKind::Fixture, make_fixtures(2));
    h.provider
        .push_ok(EntityKind::Quote, vec![quote("p0", "p0:moneyline"), fixture("wrong-kind")]);

    let result = h.scheduler.run_cycle().await;

    assert!(!result.is_success());
    assert!(h.cache.is_empty());
    assert_eq!(h.scheduler.consecutive_failures(), 1);
    assert_eq!(h.scheduler.next_mode(), SyncMode::Snapshot);
    assert_eq!(h.events.count(), 0);
}

#[tokio::test]
async fn delta_publishes_only_touched_ids() {
    let mut h = harness(3);
    h.provider.push_ok(EntityKind::Fixture, make_fixtures(3));
    h.scheduler.run_cycle().await;

    h.provider.push_ok(EntityKind::Fixture, vec![fixture("f1")]);
    let result = h.scheduler.run_cycle().await;

    assert_eq!(result.mode, SyncMode::Delta);
    assert!(result.published);
    let event = h.events.last().unwrap();
    assert_eq!(event.mode, SyncMode::Delta);
    assert_eq!(event.changed.len(), 1);
    assert!(event.changed.contains(EntityKind::Fixture, &EntityId::new("f1")));
    assert_eq!(h.cache.size(EntityKind::Fixture), 3);
}

#[tokio::test(start_paused = true)]
async fn snapshot_interval_elapsed_forces_snapshot() {
    let mut sync = config::sync(3);
    sync.snapshot_interval_ms = 2_000;
    let mut h = harness_with(sync);

    h.scheduler.run_cycle().await;
    assert_eq!(h.scheduler.next_mode(), SyncMode::Delta);

    tokio::time::advance(Duration::from_millis(1_500)).await;
    assert_eq!(h.scheduler.next_mode(), SyncMode::Delta);

    tokio::time::advance(Duration::from_millis(600)).await;
    assert_eq!(h.scheduler.next_mode(), SyncMode::Snapshot);

    let result = h.scheduler.run_cycle().await;
    assert_eq!(result.mode, SyncMode::Snapshot);
    assert_eq!(h.provider.fetch_all_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn timed_out_call_counts_as_failure() {
    let mut sync = config::sync(2);
    sync.request_timeout_ms = 100;
    let provider = Arc::new(ScriptedProvider::new().with_delay(Duration::from_millis(500)));
    let cache = Arc::new(EntityCache::new());
    let mut scheduler = SyncScheduler::new(
        sync,
        provider.clone(),
        cache.clone(),
        Arc::new(UpdatePublisher::new()),
    );
    provider.push_ok(EntityKind::Fixture, make_fixtures(1));

    let first = scheduler.run_cycle().await;
    assert!(!first.is_success());
    assert_eq!(scheduler.consecutive_failures(), 1);
    assert!(cache.is_empty());

    let second = scheduler.run_cycle().await;
    assert!(second.forced_resync());
    assert_eq!(scheduler.status().read().forced_resyncs, 1);
}
