//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use roadmap_core::registry::DEFAULT_CATEGORIES;
use roadmap_core::DEFAULT_MAX_HOPS;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub static_dir: PathBuf,
    pub airtable_api_url: String,
    pub airtable_token: String,
    pub airtable_base_id: String,
    pub airtable_table_id: String,
    pub geocoder_url: String,
    pub categories: Vec<String>,
    pub max_hops: usize,
    pub fetch_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let mut bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;
        if let Some(port) = var("PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;
            bind_address.set_port(port);
        }

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let static_dir = var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./public"));

        // --- Airtable ---
        let required = |key: &str| var(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));
        let airtable_token = required("AIRTABLE_TOKEN")?;
        let airtable_base_id = required("AIRTABLE_BASE_ID")?;
        let airtable_table_id = required("AIRTABLE_TABLE_ID")?;
        let airtable_api_url = var("AIRTABLE_API_URL")
            .unwrap_or_else(|| "https://api.airtable.com/v0".to_string());

        // --- Link Resolution and Geocoding ---
        let geocoder_url = var("GEOCODER_URL")
            .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string());

        let categories = match var("CATEGORIES") {
            Some(list) => {
                let parsed: Vec<String> = list
                    .split(';')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                if parsed.is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "CATEGORIES".to_string(),
                        "expected at least one ';'-separated category".to_string(),
                    ));
                }
                parsed
            }
            None => DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        };

        let max_hops = parse_or("MAX_HOPS", var("MAX_HOPS"), DEFAULT_MAX_HOPS)?;
        let fetch_timeout_secs = parse_or("FETCH_TIMEOUT_SECS", var("FETCH_TIMEOUT_SECS"), 10)?;

        Ok(Self {
            bind_address,
            log_level,
            static_dir,
            airtable_api_url,
            airtable_token,
            airtable_base_id,
            airtable_table_id,
            geocoder_url,
            categories,
            max_hops,
            fetch_timeout_secs,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
