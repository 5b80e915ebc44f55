//! Synchronization cycle vocabulary: modes, scopes and change sets.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use super::id::EntityId;

/// How a cycle talks to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncMode {
    /// Fetch everything and replace the cache contents per kind.
    Snapshot,
    /// Fetch only what changed since each kind's cursor and upsert it.
    Delta,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => f.write_str("SNAPSHOT"),
            Self::Delta => f.write_str("DELTA"),
        }
    }
}

/// Opaque provider-specific filter (e.g. a sport id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Entity ids touched by one cycle, grouped by kind.
///
/// Only non-empty groups are stored, so [`ChangeSet::is_empty`] is true
/// exactly when nothing was received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    by_kind: BTreeMap<EntityKind, BTreeSet<EntityId>>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the ids touched for `kind`. Empty sets are ignored.
    pub fn insert(&mut self, kind: EntityKind, ids: BTreeSet<EntityId>) {
        if ids.is_empty() {
            return;
        }
        self.by_kind.entry(kind).or_default().extend(ids);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Total number of changed ids across kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn ids(&self, kind: EntityKind) -> Option<&BTreeSet<EntityId>> {
        self.by_kind.get(&kind)
    }

    #[must_use]
    pub fn contains(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.by_kind.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.by_kind.keys().copied()
    }

    #[must_use]
    pub const fn by_kind(&self) -> &BTreeMap<EntityKind, BTreeSet<EntityId>> {
        &self.by_kind
    }
}
