//! Provider-agnostic domain types.

pub mod cursor;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod sync;

// Core domain types
pub use cursor::Cursor;
pub use entity::{Entity, EntityKind, Fixture, FixtureStatus, Quote, Selection};
pub use error::DomainError;
pub use id::{EntityId, FixtureId};
pub use money::{Price, Volume};
pub use sync::{ChangeSet, Scope, SyncMode};
