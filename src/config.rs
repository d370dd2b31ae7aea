use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::{EngagementThresholds, MatchingConfig, Place};
use crate::models::{EnsembleWeights, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub run_lock: RunLockSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub semantic: SemanticSettings,
    #[serde(default)]
    pub engagement: EngagementThresholds,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunLockSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_lock_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for RunLockSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: default_redis_url(),
            ttl_secs: default_lock_ttl_secs(),
        }
    }
}

fn default_redis_url() -> String { "redis://127.0.0.1:6379".to_string() }
fn default_lock_ttl_secs() -> u64 { 900 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_enhancement_enabled")]
    pub enhancement_enabled: bool,
    #[serde(default = "default_peer_similarity_threshold")]
    pub peer_similarity_threshold: f64,
    #[serde(default = "default_peer_limit")]
    pub peer_limit: usize,
    #[serde(default = "default_geo_radius_km")]
    pub geo_radius_km: f64,
    #[serde(default)]
    pub neighborhoods: Vec<Place>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            enhancement_enabled: default_enhancement_enabled(),
            peer_similarity_threshold: default_peer_similarity_threshold(),
            peer_limit: default_peer_limit(),
            geo_radius_km: default_geo_radius_km(),
            neighborhoods: Vec::new(),
        }
    }
}

fn default_top_k() -> usize { 3 }
fn default_enhancement_enabled() -> bool { true }
fn default_peer_similarity_threshold() -> f64 { 0.3 }
fn default_peer_limit() -> usize { 10 }
fn default_geo_radius_km() -> f64 { 10.0 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub ensemble: EnsembleWeights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_embedding_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for SemanticSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_embedding_timeout_secs(),
            cache_capacity: default_embedding_cache_capacity(),
        }
    }
}

fn default_embedding_endpoint() -> String { "http://127.0.0.1:8080/v1".to_string() }
fn default_embedding_model() -> String { "all-MiniLM-L6-v2".to_string() }
fn default_embedding_timeout_secs() -> u64 { 10 }
fn default_embedding_cache_capacity() -> u64 { 10_000 }

impl SemanticSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with RENTMATCH__)
    /// 5. DATABASE_URL / REDIS_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., RENTMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RENTMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_url_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RENTMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Explicit batch configuration handed to the daily match job
    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            weights: self.scoring.weights,
            ensemble: self.scoring.ensemble,
            top_k: self.matching.top_k,
            enhancement_enabled: self.matching.enhancement_enabled,
            peer_similarity_threshold: self.matching.peer_similarity_threshold,
            peer_limit: self.matching.peer_limit,
            geo_radius_km: self.matching.geo_radius_km,
            neighborhoods: self.matching.neighborhoods.clone(),
        }
    }
}

/// Conventional connection-string variables win over file values
fn apply_url_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("run_lock.redis_url", redis_url)?;
    }

    builder.build()
}
