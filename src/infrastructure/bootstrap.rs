//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::pinnacle::PinnacleClient;
use crate::adapter::outbound::subscriber::LogSubscriber;
use crate::application::sync::engine::SyncEngine;
use crate::infrastructure::config::settings::Config;
use crate::port::FeedProvider;

/// Build the feed provider from configuration.
pub fn build_provider(config: &Config) -> Arc<dyn FeedProvider> {
    if config.provider.username.is_none() {
        warn!("PROVIDER_USERNAME not set, requests will be unauthenticated");
    }
    let client = PinnacleClient::from_config(&config.provider);
    info!(api_url = %client.base_url(), "Feed provider configured");
    Arc::new(client)
}

/// Build a stopped engine with a [`LogSubscriber`] attached.
pub fn build_engine(config: &Config) -> SyncEngine {
    let engine = SyncEngine::new(config.sync.clone(), build_provider(config));
    // Lives as long as the engine's publisher.
    let _ = engine.subscribe(Arc::new(LogSubscriber));
    engine
}
