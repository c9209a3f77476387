use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub content: ContentConfig,
    pub collaborative: CollaborativeConfig,
    pub recommendation: RecommendationConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// Async runtime worker count; at least one.
    pub fn worker_threads(&self) -> usize {
        self.workers.max(1)
    }
}

/// TF-IDF and ranking knobs for content-based models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Candidates scoring below this cosine similarity are dropped.
    pub similarity_threshold: f64,
    /// Vocabulary cap; the most document-frequent terms are kept.
    pub max_features: usize,
    pub ngram_range: (usize, usize),
    pub strip_accents: bool,
    pub stop_words: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborativeConfig {
    pub knn_neighbors: usize,
    pub knn_min_neighbors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ttl_seconds: u64,
    pub max_sessions: usize,
    pub sweep_interval_seconds: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.1,
            max_features: 5000,
            ngram_range: (1, 2),
            strip_accents: true,
            stop_words: true,
        }
    }
}

impl Default for CollaborativeConfig {
    fn default() -> Self {
        Self {
            knn_neighbors: 40,
            knn_min_neighbors: 1,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 1000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            max_sessions: 256,
            sweep_interval_seconds: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: num_cpus::get(),
            },
            content: ContentConfig::default(),
            collaborative: CollaborativeConfig::default(),
            recommendation: RecommendationConfig::default(),
            sessions: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Layers a config file and `RECFORGE__*` environment variables over the defaults.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("RECFORGE").separator("__"))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
