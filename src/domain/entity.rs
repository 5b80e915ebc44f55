//! Synchronized market entities.
//!
//! - [`EntityKind`] - Category of synchronized data, each with its own cursor
//! - [`Fixture`] - A scheduled sporting event
//! - [`Quote`] - Prices for one market line of a fixture
//! - [`Entity`] - Either of the above, as stored in the cache
//!
//! Identity is stable per kind: a fixture is keyed by its event id and a quote
//! by `(fixture, market)`. Attributes are whatever the provider sent last.
//!
//! # Examples
//!
//! ```
//! use oddsync::domain::entity::{Entity, EntityKind, Quote, Selection};
//! use oddsync::domain::id::FixtureId;
//! use rust_decimal_macros::dec;
//!
//! let quote = Quote::new(
//!     FixtureId::new("1001"),
//!     "p0:moneyline",
//!     vec![Selection::new("home", dec!(1.91)), Selection::new("away", dec!(2.05))],
//! );
//! let entity = Entity::from(quote);
//!
//! assert_eq!(entity.kind(), EntityKind::Quote);
//! assert_eq!(entity.id().as_str(), "1001/p0:moneyline");
//! assert!(entity.validate(EntityKind::Quote).is_ok());
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{EntityId, FixtureId};
use super::money::{Price, Volume};

/// Category of synchronized data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Scheduled events (participants, start time, status).
    Fixture,
    /// Prices per market line of a fixture.
    Quote,
}

impl EntityKind {
    /// All kinds, in merge order.
    pub const ALL: [EntityKind; 2] = [EntityKind::Fixture, EntityKind::Quote];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fixture => "fixture",
            Self::Quote => "quote",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a fixture as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStatus {
    /// Not started yet.
    #[default]
    Scheduled,
    /// In play.
    Live,
    /// Settled or finished.
    Finished,
    /// Cancelled or removed from the offer.
    Cancelled,
}

/// A scheduled sporting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    id: FixtureId,
    league: Option<String>,
    home: String,
    away: String,
    starts_at: DateTime<Utc>,
    status: FixtureStatus,
    last_updated: DateTime<Utc>,
}

impl Fixture {
    /// Create a scheduled fixture stamped with the current time.
    pub fn new(
        id: FixtureId,
        home: impl Into<String>,
        away: impl Into<String>,
        starts_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            league: None,
            home: home.into(),
            away: away.into(),
            starts_at,
            status: FixtureStatus::Scheduled,
            last_updated: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_league(mut self, league: impl Into<String>) -> Self {
        self.league = Some(league.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: FixtureStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = last_updated;
        self
    }

    #[must_use]
    pub const fn id(&self) -> &FixtureId {
        &self.id
    }

    #[must_use]
    pub fn league(&self) -> Option<&str> {
        self.league.as_deref()
    }

    #[must_use]
    pub fn home(&self) -> &str {
        &self.home
    }

    #[must_use]
    pub fn away(&self) -> &str {
        &self.away
    }

    #[must_use]
    pub const fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    #[must_use]
    pub const fn status(&self) -> FixtureStatus {
        self.status
    }

    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// One priced side of a market line (e.g. "home" at 1.91).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    side: String,
    price: Price,
    /// Maximum stake accepted at this price, when the provider reports it.
    size: Option<Volume>,
}

impl Selection {
    pub fn new(side: impl Into<String>, price: Price) -> Self {
        Self {
            side: side.into(),
            price,
            size: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: Volume) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn side(&self) -> &str {
        &self.side
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Option<Volume> {
        self.size
    }
}

/// Prices for one market line of a fixture.
///
/// `market` names the line within the fixture, e.g. `p0:moneyline`,
/// `p0:spread:-1.5` or `p1:total:2.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    fixture_id: FixtureId,
    market: String,
    selections: Vec<Selection>,
    last_updated: DateTime<Utc>,
}

impl Quote {
    /// Create a quote stamped with the current time.
    pub fn new(fixture_id: FixtureId, market: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self {
            fixture_id,
            market: market.into(),
            selections,
            last_updated: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = last_updated;
        self
    }

    #[must_use]
    pub const fn fixture_id(&self) -> &FixtureId {
        &self.fixture_id
    }

    #[must_use]
    pub fn market(&self) -> &str {
        &self.market
    }

    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Price for a side, if quoted.
    #[must_use]
    pub fn price(&self, side: &str) -> Option<Price> {
        self.selections
            .iter()
            .find(|s| s.side.eq_ignore_ascii_case(side))
            .map(Selection::price)
    }

    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        EntityId::scoped(&self.fixture_id, &self.market)
    }
}

/// A synchronized entity of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Fixture(Fixture),
    Quote(Quote),
}

impl Entity {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Fixture(_) => EntityKind::Fixture,
            Self::Quote(_) => EntityKind::Quote,
        }
    }

    /// Cache key of this entity within its kind.
    #[must_use]
    pub fn id(&self) -> EntityId {
        match self {
            Self::Fixture(f) => EntityId::from(f.id()),
            Self::Quote(q) => q.entity_id(),
        }
    }

    /// Provider-supplied modification timestamp.
    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        match self {
            Self::Fixture(f) => f.last_updated(),
            Self::Quote(q) => q.last_updated(),
        }
    }

    #[must_use]
    pub const fn as_fixture(&self) -> Option<&Fixture> {
        match self {
            Self::Fixture(f) => Some(f),
            Self::Quote(_) => None,
        }
    }

    #[must_use]
    pub const fn as_quote(&self) -> Option<&Quote> {
        match self {
            Self::Quote(q) => Some(q),
            Self::Fixture(_) => None,
        }
    }

    /// Check that this entity can be stored under `expected`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] on kind mismatch, blank ids, quotes without
    /// selections, or non-positive prices.
    pub fn validate(&self, expected: EntityKind) -> Result<(), DomainError> {
        let kind = self.kind();
        if kind != expected {
            return Err(DomainError::KindMismatch {
                expected,
                actual: kind,
            });
        }

        match self {
            Self::Fixture(f) => {
                if f.id().as_str().trim().is_empty() {
                    return Err(DomainError::EmptyId { kind });
                }
            }
            Self::Quote(q) => {
                if q.fixture_id().as_str().trim().is_empty() || q.market().trim().is_empty() {
                    return Err(DomainError::EmptyId { kind });
                }
                if q.selections().is_empty() {
                    return Err(DomainError::EmptySelections {
                        id: q.entity_id().to_string(),
                    });
                }
                if let Some(bad) = q.selections().iter().find(|s| s.price() <= Decimal::ZERO) {
                    return Err(DomainError::NonPositivePrice {
                        id: q.entity_id().to_string(),
                        side: bad.side().to_string(),
                        price: bad.price(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<Fixture> for Entity {
    fn from(f: Fixture) -> Self {
        Self::Fixture(f)
    }
}

impl From<Quote> for Entity {
    fn from(q: Quote) -> Self {
        Self::Quote(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixture(id: &str) -> Fixture {
        Fixture::new(FixtureId::new(id), "Team A", "Team B", Utc::now())
    }

    #[test]
    fn fixture_entity_uses_event_id() {
        let entity = Entity::from(fixture("12345").with_league("Premier League"));
        assert_eq!(entity.kind(), EntityKind::Fixture);
        assert_eq!(entity.id().as_str(), "12345");
        assert_eq!(entity.as_fixture().and_then(Fixture::league), Some("Premier League"));
        assert!(entity.as_quote().is_none());
    }

    #[test]
    fn quote_price_lookup_ignores_case() {
        let quote = Quote::new(
            FixtureId::new("1"),
            "p0:moneyline",
            vec![
                Selection::new("Home", dec!(1.91)).with_size(dec!(1000)),
                Selection::new("Away", dec!(2.10)),
            ],
        );
        assert_eq!(quote.price("home"), Some(dec!(1.91)));
        assert_eq!(quote.price("draw"), None);
        assert_eq!(quote.selections()[0].size(), Some(dec!(1000)));
    }

    #[test]
    fn validate_rejects_kind_mismatch() {
        let entity = Entity::from(fixture("1"));
        assert_eq!(
            entity.validate(EntityKind::Quote),
            Err(DomainError::KindMismatch {
                expected: EntityKind::Quote,
                actual: EntityKind::Fixture,
            })
        );
    }

    #[test]
    fn validate_rejects_blank_fixture_id() {
        let entity = Entity::from(fixture(" "));
        assert!(matches!(
            entity.validate(EntityKind::Fixture),
            Err(DomainError::EmptyId { .. })
        ));
    }

    #[test]
    fn validate_rejects_non_positive_price() {
        let quote = Quote::new(
            FixtureId::new("1"),
            "p0:total:2.5",
            vec![Selection::new("over", dec!(0))],
        );
        let err = Entity::from(quote).validate(EntityKind::Quote).unwrap_err();
        assert!(matches!(err, DomainError::NonPositivePrice { ref side, .. } if side == "over"));
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntityKind::Quote).unwrap();
        assert_eq!(json, "\"quote\"");
        let kind: EntityKind = serde_json::from_str("\"fixture\"").unwrap();
        assert_eq!(kind, EntityKind::Fixture);
    }
}
