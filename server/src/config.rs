//! Process configuration, read once at startup.

use std::env;
use std::time::Duration;
use thiserror::Error;

use saucier_core::catalog::DEFAULT_BASE_URL;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value}")]
    NotANumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub rate_limit_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub catalog: CatalogConfig,
    /// Adds an `X-DB-Query-Count` header to every response.
    pub track_query_count: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Config {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            catalog: CatalogConfig {
                api_key: env::var("CATALOG_API_KEY")
                    .ok()
                    .filter(|k| !k.trim().is_empty()),
                base_url: env::var("CATALOG_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(number_var("CATALOG_TIMEOUT_SECS", 10)?),
                rate_limit_ms: number_var("CATALOG_RATE_LIMIT_MS", 200)?,
            },
            track_query_count: env::var("TRACK_DB_QUERY_COUNT")
                .map(|v| v == "1")
                .unwrap_or(false),
        })
    }
}

fn number_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value }),
        Err(_) => Ok(default),
    }
}
