//! Runtime configuration read from the environment
//!
//! `main` loads `.env` through `dotenvy` before calling [`Settings::from_env`].
//!
//! # Environment Variables
//!
//! - `PORT` - Server port number (default: 8080)
//! - `DATABASE_URL` - Path to the database file (default: "data.db")
//! - `SHORT_URL_PREFIX` - Prepended to codes in responses and exports
//!   (default: "http://localhost:{PORT}/url/")
//! - `AUTHORIZATION` - Optional shared secret required on authenticated routes
//! - `EXPORT_AUTHOR` - Author property of exported workbooks
//! - `RUST_LOG` - Log filter (default: "urlvault=debug,tower_http=debug")

use std::env;
use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_FILTER: &str = "urlvault=debug,tower_http=debug";
const DEFAULT_EXPORT_AUTHOR: &str = "DT URL Shortener";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SHORT_URL_PREFIX must be an absolute http(s) URL, got {0:?}")]
    InvalidPrefix(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_path: String,
    pub short_url_prefix: String,
    /// When set, authenticated routes also require this `Authorization` value
    pub api_secret: Option<String>,
    pub export_author: String,
    pub log_filter: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let short_url_prefix = env::var("SHORT_URL_PREFIX")
            .unwrap_or_else(|_| format!("http://localhost:{port}/url/"));
        validate_prefix(&short_url_prefix)?;

        Ok(Self {
            port,
            database_path: env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string()),
            short_url_prefix,
            api_secret: env::var("AUTHORIZATION").ok().filter(|secret| !secret.is_empty()),
            export_author: env::var("EXPORT_AUTHOR")
                .unwrap_or_else(|_| DEFAULT_EXPORT_AUTHOR.to_string()),
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Settings for embedding and tests: no secret, localhost prefix.
    pub fn with_prefix(short_url_prefix: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: "data.db".to_string(),
            short_url_prefix: short_url_prefix.into(),
            api_secret: None,
            export_author: DEFAULT_EXPORT_AUTHOR.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}{}", self.short_url_prefix, code)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    match Url::parse(prefix) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidPrefix(prefix.to_string())),
    }
}
