//! Oddsync - snapshot/delta synchronization for sports fixtures and odds.
//!
//! Keeps an in-memory mirror of a remote feed current. Each tick of the sync
//! loop either replaces everything (snapshot) or merges what changed since the
//! last cursor (delta), then notifies subscribers of the ids it touched.
//!
//! # Architecture
//!
//! - **`domain`** - Entities, ids, cursors, change sets
//! - **`port`** - `FeedProvider` and `UpdateSubscriber` traits
//! - **`application`** - `EntityCache`, `SyncScheduler`, `SyncEngine`
//! - **`adapter`** - Pinnacle-style HTTP provider, bundled subscribers
//! - **`infrastructure`** - Configuration and wiring
//!
//! # Features
//!
//! - `testkit` - Scripted provider and entity builders for tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use oddsync::adapter::outbound::pinnacle::PinnacleClient;
//! use oddsync::application::sync::SyncEngine;
//! use oddsync::infrastructure::config::sync::SyncConfig;
//!
//! # async fn demo() {
//! let provider = Arc::new(PinnacleClient::new("https://api.pinnacle.com"));
//! let engine = SyncEngine::new(SyncConfig::default(), provider);
//! engine.start();
//! let stats = engine.get_stats();
//! println!("{:?}", stats.counts_by_kind);
//! engine.stop().await;
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
