//! In-memory entity storage.

pub mod entity;

pub use entity::EntityCache;
