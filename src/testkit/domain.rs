//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for [`Fixture`] and [`Quote`] entities
//! so tests focus on assertions rather than construction boilerplate.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use crate::domain::{Entity, Fixture, FixtureId, Quote, Selection};

/// Create a scheduled fixture entity with placeholder teams.
pub fn fixture(id: &str) -> Entity {
    let kickoff = Utc.with_ymd_and_hms(2026, 2, 15, 20, 0, 0).single().unwrap_or_else(Utc::now);
    Fixture::new(FixtureId::new(id), "Team A", "Team B", kickoff).into()
}

/// Generate `n` fixtures named `f0`, `f1`, ..., `f{n-1}`.
pub fn make_fixtures(n: usize) -> Vec<Entity> {
    (0..n).map(|i| fixture(&format!("f{i}"))).collect()
}

/// Create a two-way quote entity for `fixture` on `market`.
pub fn quote(fixture: &str, market: &str) -> Entity {
    Quote::new(
        FixtureId::new(fixture),
        market,
        vec![
            Selection::new("home", dec!(1.91)),
            Selection::new("away", dec!(1.95)),
        ],
    )
    .into()
}

/// Create a moneyline quote for each of `f0..f{n-1}`.
pub fn make_quotes(n: usize) -> Vec<Entity> {
    (0..n).map(|i| quote(&format!("f{i}"), "p0:moneyline")).collect()
}
