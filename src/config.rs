// Configuration module for movie-score-aggregator
// Layers defaults, an optional config.toml and environment variables

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::cache::DEFAULT_TTL_HOURS;

const APP_NAME: &str = "movie-score-aggregator";
const CONFIG_FILENAME: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerConfig,

    /// Rating source configuration
    pub sources: SourcesConfig,

    /// Result cache configuration
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 8000)
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// OMDb API key (required for IMDb ratings)
    pub omdb_api_key: Option<String>,

    /// Query Rotten Tomatoes as an optional extra source (default: true)
    pub enable_rotten_tomatoes: bool,

    /// Per-source request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            omdb_api_key: None,
            enable_rotten_tomatoes: true,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long an aggregated result stays fresh, in hours (default: 24)
    pub ttl_hours: i64,

    /// Interval in minutes between sweeps of expired entries (default: 60, 0 to disable)
    /// Expired entries are never served either way; sweeping only frees memory
    pub purge_interval_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_TTL_HOURS,
            purge_interval_minutes: 60,
        }
    }
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory config.toml was looked up in
    pub config_dir: PathBuf,

    /// Server port
    pub port: u16,

    /// Bind address
    pub bind_address: String,

    /// OMDb API key (lookups fail with a configuration error without it)
    pub omdb_api_key: Option<String>,

    /// Whether Rotten Tomatoes is queried
    pub enable_rotten_tomatoes: bool,

    /// Per-source request timeout
    pub source_timeout: Duration,

    /// Cache time-to-live
    pub cache_ttl: chrono::Duration,

    /// Expired-entry sweep interval, None when disabled
    pub cache_purge_interval: Option<Duration>,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_dir, config_file, |key| std::env::var(key).ok())
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        // Environment variable takes priority
        if let Ok(path) = std::env::var("MOVIE_AGGREGATOR_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        // Then XDG config dir
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        // Fallback to current directory
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build<F>(config_dir: PathBuf, config_file: ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Port: env > config > default
        let port = env("MOVIE_AGGREGATOR_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(config_file.server.port);

        // Bind address: env > config > default
        let bind_address =
            env("MOVIE_AGGREGATOR_BIND_ADDRESS").unwrap_or(config_file.server.bind_address);

        // OMDb API key: env > config
        let omdb_api_key = env("OMDB_API_KEY")
            .or(config_file.sources.omdb_api_key)
            .filter(|k| !k.trim().is_empty());

        // Rotten Tomatoes: env > config
        let enable_rotten_tomatoes = env("ENABLE_ROTTEN_TOMATOES")
            .map(|v| parse_bool(&v))
            .unwrap_or(config_file.sources.enable_rotten_tomatoes);

        let timeout_secs = env("SOURCE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(config_file.sources.request_timeout_secs)
            .max(1);

        let ttl_hours = env("CACHE_TTL_HOURS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(config_file.cache.ttl_hours);

        let purge_minutes = env("CACHE_PURGE_INTERVAL_MINUTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(config_file.cache.purge_interval_minutes);

        Self {
            config_dir,
            port,
            bind_address,
            omdb_api_key,
            enable_rotten_tomatoes,
            source_timeout: Duration::from_secs(timeout_secs),
            cache_ttl: chrono::Duration::hours(ttl_hours.max(0)),
            cache_purge_interval: (purge_minutes > 0)
                .then(|| Duration::from_secs(purge_minutes * 60)),
        }
    }

    /// Log configuration status
    pub fn log_config(&self) {
        tracing::info!("Configuration directory: {}", self.config_dir.display());
        tracing::info!("Server listening on {}:{}", self.bind_address, self.port);

        if self.omdb_api_key.is_some() {
            tracing::info!("OMDb API key: configured");
        } else {
            tracing::warn!("OMDb API key: MISSING - movie lookups will fail");
            tracing::info!("Hint: Add omdb_api_key to config.toml or set OMDB_API_KEY env var");
        }

        if self.enable_rotten_tomatoes {
            tracing::info!("Rating sources: OMDb/IMDb + Letterboxd + Rotten Tomatoes");
        } else {
            tracing::info!("Rating sources: OMDb/IMDb + Letterboxd");
        }

        tracing::debug!("Source timeout: {:?}", self.source_timeout);
        tracing::info!("Cache TTL: {} hours", self.cache_ttl.num_hours());
        match self.cache_purge_interval {
            Some(interval) => tracing::debug!("Cache sweep interval: {:?}", interval),
            None => tracing::debug!("Cache sweep: disabled"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
