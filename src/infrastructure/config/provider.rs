//! Feed provider connection configuration.

use serde::Deserialize;

/// HTTP settings for the Pinnacle-style odds API.
///
/// Credentials are never read from the config file; they come from the
/// `PROVIDER_USERNAME` and `PROVIDER_PASSWORD` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Whole-request timeout (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// TCP/TLS connect timeout (milliseconds).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Odds format requested from the provider.
    #[serde(default = "default_odds_format")]
    pub odds_format: String,
    /// Basic-auth username, loaded from the environment.
    #[serde(skip)]
    pub username: Option<String>,
    /// Basic-auth password, loaded from the environment.
    #[serde(skip)]
    pub password: Option<String>,
}

fn default_api_url() -> String {
    "https://api.pinnacle.com".into()
}

const fn default_timeout_ms() -> u64 {
    8_000
}

const fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_odds_format() -> String {
    "DECIMAL".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            odds_format: default_odds_format(),
            username: None,
            password: None,
        }
    }
}
