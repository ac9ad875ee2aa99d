//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `NOSOROG_STORAGE_DIR` - Directory for the file-backed storage area (default: .nosorog)
//! - `NOSOROG_STORAGE_QUOTA` - Storage quota in UTF-16 code units (default: 5242880)
//! - `NOSOROG_BADGE_CAP` - Largest count shown verbatim on the header badge (default: 99)
//! - `NOSOROG_POLL_INTERVAL_MS` - How often `watch` polls the storage directory (default: 500)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::storage::DEFAULT_QUOTA;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory holding the file-backed storage area
    pub storage_dir: PathBuf,
    /// Storage quota in UTF-16 code units
    pub storage_quota: usize,
    /// Badge counts above this show as "<cap>+"
    pub badge_cap: u64,
    /// Polling interval for changes made by other processes
    pub poll_interval: Duration,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".nosorog"),
            storage_quota: DEFAULT_QUOTA,
            badge_cap: 99,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let poll_ms = get_parsed_env::<u64>("NOSOROG_POLL_INTERVAL_MS")?;
        if poll_ms == Some(0) {
            return Err(ConfigError::InvalidEnvVar(
                "NOSOROG_POLL_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            storage_dir: get_optional_env("NOSOROG_STORAGE_DIR")
                .map_or(defaults.storage_dir, PathBuf::from),
            storage_quota: get_parsed_env("NOSOROG_STORAGE_QUOTA")?
                .unwrap_or(defaults.storage_quota),
            badge_cap: get_parsed_env("NOSOROG_BADGE_CAP")?.unwrap_or(defaults.badge_cap),
            poll_interval: poll_ms.map_or(defaults.poll_interval, Duration::from_millis),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an optional environment variable parsed as `T`.
fn get_parsed_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|raw| parse_value(key, &raw))
        .transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
