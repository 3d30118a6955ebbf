//! Configuration management for Canto services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Search engine configuration
    pub search: SearchConfig,

    /// Corpora loaded at startup, addressed by code
    #[serde(default = "default_corpora")]
    pub corpora: Vec<CorpusSource>,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Longest accepted query pattern, in bytes
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Result cap; scanning halts once the running match count exceeds it
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Characters of context on each side of a match
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Compiled patterns kept in the LRU cache (0 disables caching)
    #[serde(default = "default_pattern_cache_size")]
    pub pattern_cache_size: usize,

    /// Upper bound on a compiled pattern's size, in bytes
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
}

/// A corpus file and the code clients use to select it
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CorpusSource {
    /// Corpus code, e.g. "MBH"
    pub code: String,

    /// Path to a JSON object of section id -> text
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (debug, info, warn, error, or a full EnvFilter string)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_concurrent() -> usize { 100 }
fn default_max_query_length() -> usize { 1000 }
fn default_max_results() -> usize { 100 }
fn default_window_size() -> usize { 30 }
fn default_pattern_cache_size() -> usize { 64 }
fn default_regex_size_limit() -> usize { 10 * (1 << 20) }
fn default_corpora() -> Vec<CorpusSource> {
    vec![CorpusSource {
        code: "MBH".to_string(),
        path: "mbh.json".to_string(),
    }]
}
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "canto".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SEARCH__MAX_RESULTS=50
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific config file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Find the configured source for a corpus code
    pub fn corpus_source(&self, code: &str) -> Option<&CorpusSource> {
        self.corpora.iter().find(|c| c.code == code)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent(),
            max_query_length: default_max_query_length(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            window_size: default_window_size(),
            pattern_cache_size: default_pattern_cache_size(),
            regex_size_limit: default_regex_size_limit(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            search: SearchConfig::default(),
            corpora: default_corpora(),
            observability: ObservabilityConfig::default(),
        }
    }
}
