//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!   FeedProvider              SyncScheduler              UpdateSubscriber
//!  (HTTP adapter) ──batches──► merge into cache ──events──► (log, channel,
//!                              advance cursors              closures, ...)
//! ```
//!
//! - [`FeedProvider`] - full and incremental fetches from the upstream feed
//! - [`UpdateSubscriber`] - change notifications for downstream consumers

pub mod outbound;

pub use outbound::provider::{FeedBatch, FeedProvider};
pub use outbound::subscriber::{UpdateEvent, UpdateSubscriber};
