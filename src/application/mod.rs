//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the synchronization use case.

pub mod cache;
pub mod sync;
