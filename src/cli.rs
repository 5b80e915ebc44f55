//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use crate::application::sync::engine::EngineStats;
use crate::domain::Scope;
use crate::error::Result;
use crate::infrastructure::bootstrap::build_engine;
use crate::infrastructure::config::settings::Config;

/// Oddsync - snapshot/delta synchronization for fixtures and odds feeds.
#[derive(Parser, Debug)]
#[command(name = "oddsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the sync scope (e.g. a sport id)
    #[arg(long)]
    pub scope: Option<String>,

    /// Seconds between stats log lines (0 disables)
    #[arg(long, default_value_t = 60)]
    pub stats_interval_secs: u64,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result is invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config)?;
        if let Some(scope) = &self.scope {
            config.sync.scope = Scope::new(scope.clone());
            config.validate()?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

/// Run the engine until Ctrl-C, logging stats periodically.
pub async fn run(config: Config, stats_interval: Option<Duration>) {
    let engine = build_engine(&config);
    engine.start();

    match stats_interval {
        Some(period) => {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    result = signal::ctrl_c() => {
                        if let Err(e) = result {
                            error!(error = %e, "Failed to listen for shutdown signal");
                        }
                        break;
                    }
                    _ = ticker.tick() => log_stats(&engine.get_stats()),
                }
            }
        }
        None => {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        }
    }

    info!("Shutdown signal received");
    log_stats(&engine.get_stats());
    engine.stop().await;
}

fn log_stats(stats: &EngineStats) {
    let counts = stats
        .counts_by_kind
        .iter()
        .map(|(kind, n)| format!("{kind}={n}"))
        .collect::<Vec<_>>()
        .join(" ");

    info!(
        running = stats.running,
        counts = %counts,
        current_mode = ?stats.current_mode,
        next_mode = %stats.next_mode,
        last_sync = ?stats.last_sync_time,
        failures = stats.consecutive_failures,
        forced_resyncs = stats.forced_resyncs,
        succeeded = stats.cycles_succeeded,
        failed = stats.cycles_failed,
        skipped = stats.skipped_ticks,
        "Sync stats"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["oddsync"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(cli.scope.is_none());
        assert_eq!(cli.stats_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "oddsync",
            "-c",
            "/etc/oddsync.toml",
            "--scope",
            "33",
            "--stats-interval-secs",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/oddsync.toml"));
        assert_eq!(cli.scope.as_deref(), Some("33"));
        assert_eq!(cli.stats_interval(), None);
    }
}
