//! Mock [`FeedProvider`] for testing.
//!
//! [`ScriptedProvider`] pops the next scripted result for the requested kind
//! on every call, whether full or incremental, and returns an empty batch once
//! the script for that kind is exhausted. Calls are recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Cursor, Entity, EntityKind, Scope};
use crate::error::{Error, Result};
use crate::port::{FeedBatch, FeedProvider};

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    FetchAll(EntityKind),
    FetchChangedSince(EntityKind, Cursor),
}

/// A mock provider with per-kind scripted results and an optional delay.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<EntityKind, VecDeque<Result<FeedBatch>>>>,
    calls: Mutex<Vec<ProviderCall>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long (on the tokio clock) before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful batch without a provider cursor.
    pub fn push_ok(&self, kind: EntityKind, entities: Vec<Entity>) {
        self.push_batch(kind, FeedBatch::new(entities));
    }

    /// Queue a successful batch.
    pub fn push_batch(&self, kind: EntityKind, batch: FeedBatch) {
        self.scripts
            .lock()
            .entry(kind)
            .or_default()
            .push_back(Ok(batch));
    }

    /// Queue a provider failure.
    pub fn push_err(&self, kind: EntityKind, message: &str) {
        self.scripts
            .lock()
            .entry(kind)
            .or_default()
            .push_back(Err(Error::Provider {
                status: 503,
                message: message.to_string(),
            }));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    pub fn fetch_all_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ProviderCall::FetchAll(_)))
            .count()
    }

    pub fn fetch_changed_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ProviderCall::FetchChangedSince(..)))
            .count()
    }

    async fn answer(&self, call: ProviderCall) -> Result<FeedBatch> {
        let kind = match call {
            ProviderCall::FetchAll(kind) | ProviderCall::FetchChangedSince(kind, _) => kind,
        };
        self.calls.lock().push(call);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.scripts
            .lock()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(FeedBatch::default()))
    }
}

#[async_trait]
impl FeedProvider for ScriptedProvider {
    async fn fetch_all(&self, kind: EntityKind, _scope: &Scope) -> Result<FeedBatch> {
        self.answer(ProviderCall::FetchAll(kind)).await
    }

    async fn fetch_changed_since(
        &self,
        kind: EntityKind,
        _scope: &Scope,
        cursor: &Cursor,
    ) -> Result<FeedBatch> {
        self.answer(ProviderCall::FetchChangedSince(kind, *cursor)).await
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
