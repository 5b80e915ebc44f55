//! Feed provider port for fixture and odds data.
//!
//! This module defines the trait the sync engine consumes to pull entities
//! from an upstream provider. Implementations are stateless request/response
//! clients; the engine owns cursors, retries and cache state.

use async_trait::async_trait;

use crate::domain::{Cursor, Entity, EntityKind, Scope};
use crate::error::Error;

/// Entities returned by one provider call.
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    /// Entities in provider order. Later entries win over earlier ones with
    /// the same id.
    pub entities: Vec<Entity>,
    /// Provider-issued cursor for the next delta request, when the provider
    /// protocol supplies one.
    pub cursor: Option<Cursor>,
}

impl FeedBatch {
    #[must_use]
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            cursor: None,
        }
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Upstream source of fixtures and quotes.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`); the engine may
///   issue calls for different kinds concurrently
/// - Any non-success response, including rate limiting and payloads that fail
///   to parse, must be returned as an `Err`
/// - Rate-limit backoff, authentication and request signing are the
///   implementation's own concern
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Fetch every entity of `kind` within `scope`.
    async fn fetch_all(&self, kind: EntityKind, scope: &Scope) -> Result<FeedBatch, Error>;

    /// Fetch entities of `kind` changed after `cursor`.
    async fn fetch_changed_since(
        &self,
        kind: EntityKind,
        scope: &Scope,
        cursor: &Cursor,
    ) -> Result<FeedBatch, Error>;

    /// Get the provider name for logging/debugging.
    fn provider_name(&self) -> &'static str;
}
