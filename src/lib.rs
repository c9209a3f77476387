pub mod algorithms;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use algorithms::{RecommendationAlgorithm, Recommender};
pub use config::Config;
pub use error::{RecommenderError, Result};
pub use models::*;

use services::RecommendationService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let service = Arc::new(RecommendationService::in_memory(config.clone()));

        Self { config, service }
    }
}

/// Installs the global subscriber; `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
