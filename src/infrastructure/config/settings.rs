//! Top-level settings file.
//!
//! `[sync]`, `[provider]` and `[logging]` are all optional. Provider
//! credentials never live in the file; they are read from the environment
//! (a `.env` file works too when the binary loads it).
//!
//! ```no_run
//! use oddsync::infrastructure::config::settings::Config;
//!
//! # fn demo() -> oddsync::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! println!("polling every {:?}", config.sync.delta_polling_interval());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use super::logging::LoggingConfig;
use super::provider::ProviderConfig;
use super::sync::SyncConfig;
use crate::error::{ConfigError, Result};

/// Parsed and validated settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn positive(field: &'static str, value: u64) -> std::result::Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(field, "must be greater than 0"));
    }
    Ok(())
}

impl Config {
    /// Parse TOML, pick up `PROVIDER_USERNAME`/`PROVIDER_PASSWORD`, validate.
    ///
    /// # Errors
    ///
    /// Malformed TOML or a failed validation.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Credentials come from the environment, never from the config file
        config.provider.username = std::env::var("PROVIDER_USERNAME").ok();
        config.provider.password = std::env::var("PROVIDER_PASSWORD").ok();

        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a settings file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ReadFile`], [`ConfigError::Parse`], or any validation
    /// error.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Check ranges and cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        let sync = &self.sync;
        positive("snapshot_interval_ms", sync.snapshot_interval_ms)?;
        positive("delta_polling_interval_ms", sync.delta_polling_interval_ms)?;
        positive("failure_threshold", u64::from(sync.failure_threshold))?;
        positive("request_timeout_ms", sync.request_timeout_ms)?;
        if sync.delta_polling_interval_ms > sync.snapshot_interval_ms {
            return Err(invalid("delta_polling_interval_ms", "must be <= snapshot_interval_ms").into());
        }
        if sync.kinds.is_empty() {
            return Err(ConfigError::MissingField { field: "kinds" }.into());
        }
        let mut seen = BTreeSet::new();
        if let Some(kind) = sync.kinds.iter().find(|kind| !seen.insert(**kind)) {
            return Err(invalid("kinds", &format!("`{kind}` is listed more than once")).into());
        }
        if sync.scope.as_str().trim().is_empty() {
            return Err(ConfigError::MissingField { field: "scope" }.into());
        }

        let provider = &self.provider;
        if provider.api_url.is_empty() {
            return Err(ConfigError::MissingField { field: "api_url" }.into());
        }
        Url::parse(&provider.api_url).map_err(|e| invalid("api_url", &e.to_string()))?;
        positive("timeout_ms", provider.timeout_ms)?;
        positive("connect_timeout_ms", provider.connect_timeout_ms)?;

        Ok(())
    }

    /// Initialize logging with the configured settings.
    ///
    /// Returns false if a global subscriber was already installed.
    pub fn init_logging(&self) -> bool {
        self.logging.init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.sync.snapshot_interval_ms, 3_600_000);
        assert_eq!(config.sync.delta_polling_interval_ms, 5_000);
        assert_eq!(config.sync.failure_threshold, 3);
        assert_eq!(config.sync.kinds, vec![EntityKind::Fixture, EntityKind::Quote]);
        assert_eq!(config.provider.odds_format, "DECIMAL");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_sync_section() {
        let config = Config::parse_toml(
            r#"
            [sync]
            snapshot_interval_ms = 600000
            delta_polling_interval_ms = 2000
            failure_threshold = 5
            scope = "33"
            kinds = ["fixture"]
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.snapshot_interval().as_secs(), 600);
        assert_eq!(config.sync.delta_polling_interval().as_millis(), 2000);
        assert_eq!(config.sync.failure_threshold, 5);
        assert_eq!(config.sync.scope.as_str(), "33");
        assert_eq!(config.sync.kinds, vec![EntityKind::Fixture]);
    }

    #[test]
    fn rejects_zero_threshold() {
        let err = Config::parse_toml("[sync]\nfailure_threshold = 0\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "failure_threshold",
                ..
            })
        ));
    }

    #[test]
    fn rejects_polling_slower_than_snapshots() {
        let err = Config::parse_toml(
            "[sync]\nsnapshot_interval_ms = 1000\ndelta_polling_interval_ms = 5000\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "delta_polling_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_kinds() {
        let err = Config::parse_toml("[sync]\nkinds = []\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "kinds" })
        ));
    }

    #[test]
    fn rejects_invalid_api_url() {
        let err = Config::parse_toml("[provider]\napi_url = \"not a url\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "api_url", .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Config::parse_toml("[sync\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
