//! Shared application state for the web server.

use std::sync::Arc;

use atopix_config::AppConfig;
use atopix_ingestion::PreprocessCache;
use atopix_models::ModelRegistry;

/// Shared state injected into every Axum handler.
#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub cache: PreprocessCache,
    pub models: ModelRegistry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let cache = PreprocessCache::new(config.cache.ttl_secs);
        Self::with_cache(config, cache)
    }

    /// Build state around an existing cache (e.g. one with a test clock).
    pub fn with_cache(config: AppConfig, cache: PreprocessCache) -> Self {
        Self {
            config,
            cache,
            models: ModelRegistry::new(),
        }
    }
}

pub type SharedState = Arc<AppState>;
