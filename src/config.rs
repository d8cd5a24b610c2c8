//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BROADCAST_TOP_N, DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_DEBOUNCE_WINDOW_MS,
    DEFAULT_LATE_VERDICT_GRACE_MINUTES, DEFAULT_LOCK_TTL_SECS, DEFAULT_PAGE_CACHE_TTL_SECS,
    DEFAULT_RANKING_CACHE_TTL_SECS, DEFAULT_REPLAY_BACKOFF_BASE_MS, DEFAULT_REPLAY_BACKOFF_MAX_MS,
    DEFAULT_REPLAY_INTERVAL_SECS, DEFAULT_REPLAY_LOOKBACK_DAYS, DEFAULT_REPLAY_MAX_ATTEMPTS,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub standings: StandingsConfig,
    pub dead_letter: DeadLetterConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Ingestion, caching and broadcast tuning
#[derive(Debug, Clone)]
pub struct StandingsConfig {
    /// Lease of the per-submission lock
    pub lock_ttl: Duration,
    /// Grace after contest end during which verdicts are still applied
    pub late_grace_minutes: i64,
    /// TTL of cached standings pages
    pub page_cache_ttl: Duration,
    /// TTL of the memoized full ranking
    pub ranking_cache_ttl: Duration,
    /// Delay before a recompute pass starts
    pub debounce_window: Duration,
    /// Entries pushed with each standings update
    pub broadcast_top_n: usize,
}

/// Dead-letter replay configuration
#[derive(Debug, Clone)]
pub struct DeadLetterConfig {
    pub replay_interval: Duration,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub lookback_days: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            standings: StandingsConfig::from_env()?,
            dead_letter: DeadLetterConfig::from_env()?,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset
fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        })
    }
}

impl StandingsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            lock_ttl: Duration::from_secs(env_or("JUDGE_LOCK_TTL_SECS", DEFAULT_LOCK_TTL_SECS)?),
            late_grace_minutes: env_or(
                "LATE_VERDICT_GRACE_MINUTES",
                DEFAULT_LATE_VERDICT_GRACE_MINUTES,
            )?,
            page_cache_ttl: Duration::from_secs(env_or(
                "STANDINGS_PAGE_CACHE_TTL_SECS",
                DEFAULT_PAGE_CACHE_TTL_SECS,
            )?),
            ranking_cache_ttl: Duration::from_secs(env_or(
                "STANDINGS_RANKING_CACHE_TTL_SECS",
                DEFAULT_RANKING_CACHE_TTL_SECS,
            )?),
            debounce_window: Duration::from_millis(env_or(
                "STANDINGS_DEBOUNCE_MS",
                DEFAULT_DEBOUNCE_WINDOW_MS,
            )?),
            broadcast_top_n: env_or("STANDINGS_BROADCAST_TOP_N", DEFAULT_BROADCAST_TOP_N)?,
        })
    }
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(DEFAULT_LOCK_TTL_SECS),
            late_grace_minutes: DEFAULT_LATE_VERDICT_GRACE_MINUTES,
            page_cache_ttl: Duration::from_secs(DEFAULT_PAGE_CACHE_TTL_SECS),
            ranking_cache_ttl: Duration::from_secs(DEFAULT_RANKING_CACHE_TTL_SECS),
            debounce_window: Duration::from_millis(DEFAULT_DEBOUNCE_WINDOW_MS),
            broadcast_top_n: DEFAULT_BROADCAST_TOP_N,
        }
    }
}

impl DeadLetterConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            replay_interval: Duration::from_secs(env_or(
                "DEAD_LETTER_REPLAY_INTERVAL_SECS",
                DEFAULT_REPLAY_INTERVAL_SECS,
            )?),
            max_attempts: env_or("DEAD_LETTER_MAX_ATTEMPTS", DEFAULT_REPLAY_MAX_ATTEMPTS)?,
            backoff_base_ms: env_or("DEAD_LETTER_BACKOFF_BASE_MS", DEFAULT_REPLAY_BACKOFF_BASE_MS)?,
            backoff_max_ms: env_or("DEAD_LETTER_BACKOFF_MAX_MS", DEFAULT_REPLAY_BACKOFF_MAX_MS)?,
            lookback_days: env_or("DEAD_LETTER_LOOKBACK_DAYS", DEFAULT_REPLAY_LOOKBACK_DAYS)?,
        })
    }
}

impl Default for DeadLetterConfig {
    fn default() -> Self {
        Self {
            replay_interval: Duration::from_secs(DEFAULT_REPLAY_INTERVAL_SECS),
            max_attempts: DEFAULT_REPLAY_MAX_ATTEMPTS,
            backoff_base_ms: DEFAULT_REPLAY_BACKOFF_BASE_MS,
            backoff_max_ms: DEFAULT_REPLAY_BACKOFF_MAX_MS,
            lookback_days: DEFAULT_REPLAY_LOOKBACK_DAYS,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let standings = StandingsConfig::default();
        assert_eq!(standings.lock_ttl, Duration::from_secs(30));
        assert_eq!(standings.late_grace_minutes, 5);
        assert_eq!(standings.page_cache_ttl, Duration::from_secs(60));
        assert_eq!(standings.ranking_cache_ttl, Duration::from_secs(300));
        assert_eq!(standings.broadcast_top_n, 50);
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        // SAFETY: the variable name is unique to this test
        unsafe { env::set_var("ALGOJUDGE_TEST_BAD_PORT", "not-a-port") };
        let result: Result<u16, _> = env_or("ALGOJUDGE_TEST_BAD_PORT", 8080);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(name)) if name == "ALGOJUDGE_TEST_BAD_PORT"
        ));

        let fallback: u16 = env_or("ALGOJUDGE_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(fallback, 8080);
    }
}
