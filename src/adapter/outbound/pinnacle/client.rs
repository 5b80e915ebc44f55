//! Pinnacle-style odds API client.
//!
//! Fixtures come from `GET /v1/fixtures` and quotes from `GET /v2/odds`. Both
//! endpoints accept `since` and answer with a `last` token, which becomes the
//! batch cursor. Rate limits and server errors are surfaced as errors; the
//! sync engine decides what to do with them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::dto::{ErrorBody, FixturesResponse, OddsResponse};
use crate::domain::{Cursor, EntityKind, Scope};
use crate::error::{Error, Result};
use crate::infrastructure::config::provider::ProviderConfig;
use crate::port::{FeedBatch, FeedProvider};

const FIXTURES_PATH: &str = "/v1/fixtures";
const ODDS_PATH: &str = "/v2/odds";

/// HTTP client for a Pinnacle-style odds API.
pub struct PinnacleClient {
    http: HttpClient,
    base_url: String,
    odds_format: String,
    credentials: Option<(String, Option<String>)>,
}

impl PinnacleClient {
    /// Create an unauthenticated client with default HTTP settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
            odds_format: "DECIMAL".into(),
            credentials: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url: config.api_url.clone(),
            odds_format: config.odds_format.clone(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request URL for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the base URL is invalid.
    pub fn endpoint(&self, kind: EntityKind, scope: &Scope, since: Option<i64>) -> Result<Url> {
        let path = match kind {
            EntityKind::Fixture => FIXTURES_PATH,
            EntityKind::Quote => ODDS_PATH,
        };
        let mut url = Url::parse(&self.base_url)?.join(path)?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("sportId", scope.as_str());
            if kind == EntityKind::Quote {
                query.append_pair("oddsFormat", &self.odds_format);
            }
            if let Some(since) = since {
                query.append_pair("since", &since.to_string());
            }
            if kind == EntityKind::Quote {
                query.append_pair("isLive", "false");
            }
        }

        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!(url = %url, "Fetching feed");

        let mut request = self.http.get(url);
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, pass.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, retry_after, &body));
        }
        decode(&body)
    }

    async fn fetch(&self, kind: EntityKind, scope: &Scope, since: Option<i64>) -> Result<FeedBatch> {
        let url = self.endpoint(kind, scope, since)?;

        let (entities, last) = match kind {
            EntityKind::Fixture => match self.get::<FixturesResponse>(url).await? {
                Some(resp) => {
                    let last = resp.last;
                    (resp.into_entities(), last)
                }
                None => (Vec::new(), None),
            },
            EntityKind::Quote => match self.get::<OddsResponse>(url).await? {
                Some(resp) => {
                    let last = resp.last;
                    (resp.into_entities(), last)
                }
                None => (Vec::new(), None),
            },
        };

        debug!(kind = %kind, count = entities.len(), last = ?last, "Fetched feed");

        let batch = FeedBatch::new(entities);
        Ok(match last {
            Some(token) => batch.with_cursor(Cursor::Token(token)),
            None => batch,
        })
    }
}

/// Query value for `since`.
///
/// Only a `last` token from an earlier response is a valid `since`. Clock
/// cursors (set when a response carried no token) request the full feed,
/// which a delta merge upserts without losing anything.
fn since(cursor: &Cursor) -> Option<i64> {
    match cursor {
        Cursor::Epoch | Cursor::At(_) => None,
        Cursor::Token(token) => Some(*token),
    }
}

/// Parse a success body. An empty body means nothing changed.
fn decode<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

/// Map a non-success response to an error.
fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message);

    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            retry_after_secs: retry_after,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Provider {
            status: status.as_u16(),
            message: "authentication failed - invalid API credentials".into(),
        },
        s if s.is_server_error() => Error::Provider {
            status: s.as_u16(),
            message: detail.unwrap_or_else(|| "server error".into()),
        },
        s => Error::Provider {
            status: s.as_u16(),
            message: detail.unwrap_or_else(|| s.to_string()),
        },
    }
}

#[async_trait]
impl FeedProvider for PinnacleClient {
    async fn fetch_all(&self, kind: EntityKind, scope: &Scope) -> Result<FeedBatch> {
        self.fetch(kind, scope, None).await
    }

    async fn fetch_changed_since(
        &self,
        kind: EntityKind,
        scope: &Scope,
        cursor: &Cursor,
    ) -> Result<FeedBatch> {
        self.fetch(kind, scope, since(cursor)).await
    }

    fn provider_name(&self) -> &'static str {
        "Pinnacle"
    }
}
