//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`provider`] - [`ScriptedProvider`](provider::ScriptedProvider), a mock
//!   [`FeedProvider`](crate::port::FeedProvider) with per-kind scripted results.
//! - [`domain`] - Builders for fixtures and quotes.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod provider;
