//! Pinnacle-style REST response types and their domain conversions.
//!
//! Odds periods are flattened into one [`Quote`] per market line:
//!
//! | Line | Market id | Sides |
//! |------|-----------|-------|
//! | moneyline | `p{n}:moneyline` | `home`, `away`, `draw` |
//! | spread | `p{n}:spread:{hdp}` | `home`, `away` |
//! | total | `p{n}:total:{points}` | `over`, `under` |
//!
//! Missing prices drop the selection; lines left with no selections are
//! skipped. Values the provider did send are passed through untouched and
//! validated by the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::domain::{Entity, Fixture, FixtureId, FixtureStatus, Quote, Selection};

/// Event ids arrive as numbers from some endpoints and strings from others.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// `GET /v1/fixtures` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixturesResponse {
    pub sport_id: Option<i64>,
    /// Incremental cursor to pass back as `since`.
    pub last: Option<i64>,
    #[serde(default)]
    pub league: Vec<FixtureLeague>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureLeague {
    pub id: i64,
    pub name: Option<String>,
    #[serde(default)]
    pub events: Vec<FixtureEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureEvent {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub starts: DateTime<Utc>,
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub live_status: i32,
    /// `O` open, `H` temporarily unavailable, `I` unavailable.
    pub status: Option<String>,
}

impl FixtureEvent {
    fn status(&self) -> FixtureStatus {
        match (self.live_status, self.status.as_deref()) {
            (1, _) => FixtureStatus::Live,
            (_, Some("I")) => FixtureStatus::Cancelled,
            _ => FixtureStatus::Scheduled,
        }
    }
}

impl FixturesResponse {
    /// Flatten leagues into fixture entities.
    pub fn into_entities(self) -> Vec<Entity> {
        self.league
            .into_iter()
            .flat_map(|league| {
                let name = league.name;
                league.events.into_iter().map(move |event| {
                    let status = event.status();
                    let mut fixture = Fixture::new(
                        FixtureId::new(event.id),
                        event.home,
                        event.away,
                        event.starts,
                    )
                    .with_status(status);
                    if let Some(name) = &name {
                        fixture = fixture.with_league(name.clone());
                    }
                    Entity::from(fixture)
                })
            })
            .collect()
    }
}

/// `GET /v2/odds` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsResponse {
    pub sport_id: Option<i64>,
    pub league_id: Option<i64>,
    pub last: Option<i64>,
    #[serde(default)]
    pub events: Vec<OddsEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsEvent {
    #[serde(deserialize_with = "id_string")]
    pub event_id: String,
    pub live_status: Option<i32>,
    pub home: Option<String>,
    pub away: Option<String>,
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub periods: Vec<OddsPeriod>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsPeriod {
    pub line_id: Option<i64>,
    pub number: i32,
    pub cutoff: Option<DateTime<Utc>>,
    pub max_moneyline: Option<Decimal>,
    pub max_spread: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub moneyline: Option<Moneyline>,
    #[serde(default)]
    pub spreads: Vec<Spread>,
    #[serde(default)]
    pub totals: Vec<Total>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Moneyline {
    pub home: Option<Decimal>,
    pub away: Option<Decimal>,
    pub draw: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Spread {
    pub hdp: Decimal,
    pub home: Option<Decimal>,
    pub away: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Total {
    pub points: Decimal,
    pub over: Option<Decimal>,
    pub under: Option<Decimal>,
}

fn selections(sides: &[(&str, Option<Decimal>)], max: Option<Decimal>) -> Vec<Selection> {
    sides
        .iter()
        .filter_map(|(side, price)| {
            price.map(|p| {
                let selection = Selection::new(*side, p);
                match max {
                    Some(size) => selection.with_size(size),
                    None => selection,
                }
            })
        })
        .collect()
}

impl OddsPeriod {
    fn quotes(&self, fixture_id: &FixtureId) -> Vec<Quote> {
        let n = self.number;
        let mut lines = Vec::new();

        if let Some(ml) = &self.moneyline {
            lines.push((
                format!("p{n}:moneyline"),
                selections(
                    &[("home", ml.home), ("away", ml.away), ("draw", ml.draw)],
                    self.max_moneyline,
                ),
            ));
        }
        for spread in &self.spreads {
            lines.push((
                format!("p{n}:spread:{}", spread.hdp.normalize()),
                selections(
                    &[("home", spread.home), ("away", spread.away)],
                    self.max_spread,
                ),
            ));
        }
        for total in &self.totals {
            lines.push((
                format!("p{n}:total:{}", total.points.normalize()),
                selections(
                    &[("over", total.over), ("under", total.under)],
                    self.max_total,
                ),
            ));
        }

        lines
            .into_iter()
            .filter(|(_, sels)| !sels.is_empty())
            .map(|(market, sels)| Quote::new(fixture_id.clone(), market, sels))
            .collect()
    }
}

impl OddsResponse {
    /// Flatten events and periods into quote entities.
    pub fn into_entities(self) -> Vec<Entity> {
        self.events
            .iter()
            .flat_map(|event| {
                let fixture_id = FixtureId::new(event.event_id.clone());
                event
                    .periods
                    .iter()
                    .flat_map(move |p| p.quotes(&fixture_id))
                    .collect::<Vec<_>>()
            })
            .map(Entity::from)
            .collect()
    }
}

/// Error body returned alongside non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}
