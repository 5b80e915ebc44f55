//! Snapshot/delta synchronization.
//!
//! - [`scheduler`] - one cycle: mode selection, fetch, merge, cursor advance
//! - [`engine`] - lifecycle and the periodic timer
//! - [`publisher`] - fan-out of change notifications
//! - [`failure`] - consecutive-failure escalation

pub mod engine;
pub mod failure;
pub mod publisher;
pub mod scheduler;

pub use engine::{EngineStats, SyncEngine};
pub use failure::FailureTracker;
pub use publisher::{PublishReport, Subscription, UpdatePublisher};
pub use scheduler::{CycleOutcome, SyncCycleResult, SyncScheduler, SyncStatus};
