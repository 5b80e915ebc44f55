//! Thread-safe entity cache with atomic batch merges.
//!
//! Each kind lives in an immutable partition behind an `Arc`. A merge builds
//! the next partition off to the side and swaps it in under a short write lock,
//! so readers see either the whole batch or none of it. Staging happens under
//! an upgradable read lock, which keeps concurrent readers unblocked while
//! serializing writers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::trace;

use crate::domain::{
    ChangeSet, DomainError, Entity, EntityId, EntityKind, FixtureId, Quote, SyncMode,
};

/// Immutable view of every entity of one kind.
pub type Partition = Arc<HashMap<EntityId, Entity>>;

/// In-memory mirror of provider state, keyed by kind and id.
pub struct EntityCache {
    partitions: RwLock<HashMap<EntityKind, Partition>>,
}

impl EntityCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Replace every entity of `kind` with `entities`.
    ///
    /// Returns the ids stored, which is the full change set for a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if any entity fails validation; the cache is
    /// left untouched.
    pub fn replace_all(
        &self,
        kind: EntityKind,
        entities: Vec<Entity>,
    ) -> Result<BTreeSet<EntityId>, DomainError> {
        let changes = self.apply(SyncMode::Snapshot, vec![(kind, entities)])?;
        Ok(changes.ids(kind).cloned().unwrap_or_default())
    }

    /// Insert or overwrite `entities` by id.
    ///
    /// Returns every id received, whether or not its value changed.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if any entity fails validation; the cache is
    /// left untouched.
    pub fn upsert(
        &self,
        kind: EntityKind,
        entities: Vec<Entity>,
    ) -> Result<BTreeSet<EntityId>, DomainError> {
        let changes = self.apply(SyncMode::Delta, vec![(kind, entities)])?;
        Ok(changes.ids(kind).cloned().unwrap_or_default())
    }

    /// Merge batches for several kinds in one step.
    ///
    /// Snapshot mode replaces each listed kind; delta mode upserts into it.
    /// Kinds not listed are untouched. All batches are validated before any
    /// partition is swapped, and all swaps happen under one write lock.
    ///
    /// # Errors
    ///
    /// Returns the first [`DomainError`] found; nothing is applied.
    pub fn apply(
        &self,
        mode: SyncMode,
        batches: Vec<(EntityKind, Vec<Entity>)>,
    ) -> Result<ChangeSet, DomainError> {
        for (kind, entities) in &batches {
            for entity in entities {
                entity.validate(*kind)?;
            }
        }

        let partitions = self.partitions.upgradable_read();

        let mut changes = ChangeSet::new();
        let mut staged: BTreeMap<EntityKind, HashMap<EntityId, Entity>> = BTreeMap::new();
        for (kind, entities) in batches {
            // A kind listed twice extends its staged partition.
            let next = staged.entry(kind).or_insert_with(|| match mode {
                SyncMode::Snapshot => HashMap::with_capacity(entities.len()),
                SyncMode::Delta => partitions
                    .get(&kind)
                    .map(|p| p.as_ref().clone())
                    .unwrap_or_default(),
            });

            let mut ids = BTreeSet::new();
            for entity in entities {
                let id = entity.id();
                next.insert(id.clone(), entity);
                ids.insert(id);
            }

            trace!(kind = %kind, mode = %mode, received = ids.len(), total = next.len(), "Staged partition");
            changes.insert(kind, ids);
        }

        let mut partitions = RwLockUpgradableReadGuard::upgrade(partitions);
        for (kind, partition) in staged {
            partitions.insert(kind, Arc::new(partition));
        }

        Ok(changes)
    }

    /// Get a copy of one entity.
    #[must_use]
    pub fn get(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        self.partitions
            .read()
            .get(&kind)
            .and_then(|p| p.get(id).cloned())
    }

    /// Get a consistent view of every entity of `kind`.
    ///
    /// The returned partition is never mutated; later merges swap in a new one.
    #[must_use]
    pub fn snapshot(&self, kind: EntityKind) -> Partition {
        self.partitions
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// All quotes priced for a fixture.
    #[must_use]
    pub fn quotes_for(&self, fixture_id: &FixtureId) -> Vec<Quote> {
        let quotes = self.snapshot(EntityKind::Quote);
        let mut found: Vec<Quote> = quotes
            .values()
            .filter_map(Entity::as_quote)
            .filter(|q| q.fixture_id() == fixture_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.market().cmp(b.market()));
        found
    }

    /// Number of entities of `kind`.
    #[must_use]
    pub fn size(&self, kind: EntityKind) -> usize {
        self.partitions.read().get(&kind).map_or(0, |p| p.len())
    }

    /// Entity counts for every kind present.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<EntityKind, usize> {
        self.partitions
            .read()
            .iter()
            .map(|(kind, p)| (*kind, p.len()))
            .collect()
    }

    /// Returns true if no kind holds any entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.read().values().all(|p| p.is_empty())
    }

    /// Drop every partition.
    pub fn clear(&self) {
        self.partitions.write().clear();
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fixture, Selection};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn fixture(id: &str, home: &str) -> Entity {
        Fixture::new(FixtureId::new(id), home, "Away FC", Utc::now()).into()
    }

    fn quote(fixture: &str, market: &str) -> Entity {
        Quote::new(
            FixtureId::new(fixture),
            market,
            vec![Selection::new("home", dec!(1.91)), Selection::new("away", dec!(1.95))],
        )
        .into()
    }

    fn ids(raw: &[&str]) -> BTreeSet<EntityId> {
        raw.iter().map(|s| EntityId::from(*s)).collect()
    }

    #[test]
    fn test_replace_all_discards_previous_entities() {
        let cache = EntityCache::new();
        cache
            .replace_all(EntityKind::Fixture, vec![fixture("1", "A"), fixture("2", "B")])
            .unwrap();

        let changed = cache
            .replace_all(EntityKind::Fixture, vec![fixture("3", "C")])
            .unwrap();

        assert_eq!(changed, ids(&["3"]));
        assert_eq!(cache.size(EntityKind::Fixture), 1);
        assert!(cache.get(EntityKind::Fixture, &EntityId::from("1")).is_none());
    }

    #[test]
    fn test_replace_all_is_idempotent() {
        let cache = EntityCache::new();
        let batch = vec![fixture("1", "A"), fixture("2", "B")];

        let first = cache.replace_all(EntityKind::Fixture, batch.clone()).unwrap();
        let view_after_first = cache.snapshot(EntityKind::Fixture);
        let second = cache.replace_all(EntityKind::Fixture, batch).unwrap();

        assert_eq!(first, second);
        assert_eq!(second, ids(&["1", "2"]));
        assert_eq!(*view_after_first, *cache.snapshot(EntityKind::Fixture));
    }

    #[test]
    fn test_upsert_reports_received_ids_even_if_unchanged() {
        let cache = EntityCache::new();
        cache
            .replace_all(EntityKind::Fixture, vec![fixture("1", "A"), fixture("2", "B")])
            .unwrap();

        let changed = cache
            .upsert(EntityKind::Fixture, vec![fixture("2", "B"), fixture("4", "D")])
            .unwrap();

        assert_eq!(changed, ids(&["2", "4"]));
        assert_eq!(cache.size(EntityKind::Fixture), 3);
    }

    #[test]
    fn test_upsert_last_write_wins_within_batch() {
        let cache = EntityCache::new();
        cache
            .upsert(EntityKind::Fixture, vec![fixture("1", "First"), fixture("1", "Second")])
            .unwrap();

        let stored = cache.get(EntityKind::Fixture, &EntityId::from("1")).unwrap();
        assert_eq!(stored.as_fixture().unwrap().home(), "Second");
        assert_eq!(cache.size(EntityKind::Fixture), 1);
    }

    #[test]
    fn test_invalid_entity_rejects_whole_batch() {
        let cache = EntityCache::new();
        cache
            .replace_all(EntityKind::Fixture, vec![fixture("1", "A")])
            .unwrap();
        let before = cache.snapshot(EntityKind::Fixture);

        let result = cache.upsert(EntityKind::Fixture, vec![fixture("2", "B"), fixture("", "C")]);

        assert!(result.is_err());
        assert!(Arc::ptr_eq(&before, &cache.snapshot(EntityKind::Fixture)));
    }

    #[test]
    fn test_apply_validates_every_kind_before_merging() {
        let cache = EntityCache::new();
        let bad_quote: Entity = Quote::new(FixtureId::new("1"), "p0:moneyline", vec![]).into();

        let result = cache.apply(
            SyncMode::Snapshot,
            vec![
                (EntityKind::Fixture, vec![fixture("1", "A")]),
                (EntityKind::Quote, vec![bad_quote]),
            ],
        );

        assert!(matches!(result, Err(DomainError::EmptySelections { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_apply_repeated_kind_keeps_every_batch() {
        let cache = EntityCache::new();
        cache
            .replace_all(EntityKind::Fixture, vec![fixture("1", "A")])
            .unwrap();

        for mode in [SyncMode::Delta, SyncMode::Snapshot] {
            let changes = cache
                .apply(
                    mode,
                    vec![
                        (EntityKind::Fixture, vec![fixture("2", "B")]),
                        (EntityKind::Fixture, vec![fixture("3", "C")]),
                    ],
                )
                .unwrap();

            assert_eq!(changes.len(), 2);
            assert!(cache.get(EntityKind::Fixture, &EntityId::new("2")).is_some());
            assert!(cache.get(EntityKind::Fixture, &EntityId::new("3")).is_some());
        }
        assert_eq!(cache.size(EntityKind::Fixture), 2);
    }

    #[test]
    fn test_snapshot_is_stable_across_merges() {
        let cache = EntityCache::new();
        cache
            .replace_all(EntityKind::Fixture, vec![fixture("1", "A")])
            .unwrap();
        let view = cache.snapshot(EntityKind::Fixture);

        cache
            .upsert(EntityKind::Fixture, vec![fixture("2", "B")])
            .unwrap();

        assert_eq!(view.len(), 1);
        assert_eq!(cache.size(EntityKind::Fixture), 2);
    }

    #[test]
    fn test_quotes_for_fixture() {
        let cache = EntityCache::new();
        cache
            .replace_all(
                EntityKind::Quote,
                vec![
                    quote("1", "p0:total:2.5"),
                    quote("1", "p0:moneyline"),
                    quote("2", "p0:moneyline"),
                ],
            )
            .unwrap();

        let quotes = cache.quotes_for(&FixtureId::new("1"));
        let markets: Vec<_> = quotes.iter().map(Quote::market).collect();
        assert_eq!(markets, vec!["p0:moneyline", "p0:total:2.5"]);
    }

    #[test]
    fn test_counts_and_clear() {
        let cache = EntityCache::new();
        cache
            .replace_all(EntityKind::Fixture, vec![fixture("1", "A")])
            .unwrap();
        cache
            .replace_all(EntityKind::Quote, vec![quote("1", "p0:moneyline")])
            .unwrap();

        let counts = cache.counts();
        assert_eq!(counts.get(&EntityKind::Fixture), Some(&1));
        assert_eq!(counts.get(&EntityKind::Quote), Some(&1));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.size(EntityKind::Quote), 0);
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_batch() {
        let cache = Arc::new(EntityCache::new());
        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for round in 0..200 {
                    let batch = (0..10)
                        .map(|i| fixture(&format!("{i}"), &format!("round-{round}")))
                        .collect();
                    cache.replace_all(EntityKind::Fixture, batch).unwrap();
                }
            })
        };

        for _ in 0..200 {
            let view = cache.snapshot(EntityKind::Fixture);
            let homes: BTreeSet<_> = view
                .values()
                .filter_map(Entity::as_fixture)
                .map(|f| f.home().to_string())
                .collect();
            assert!(homes.len() <= 1, "saw mixed rounds: {homes:?}");
        }

        writer.join().unwrap();
    }
}
