//! Runtime configuration resolved from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::metadata::bandcamp::BandcampMode;
use crate::metadata::youtube::DEFAULT_API_BASE;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/setlist";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_EMAIL_FROM: &str = "noreply@setlist.local";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Resolved settings for the metadata pipeline and token flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetlistConfig {
    pub database_url: String,
    /// YouTube Data API key; YouTube lookups fail without one.
    pub youtube_api_key: Option<String>,
    pub youtube_api_base: String,
    /// WebDriver endpoint for the browser-backed Bandcamp source.
    pub webdriver_url: Option<String>,
    pub bandcamp_mode: BandcampMode,
    pub http_timeout: Duration,
    /// Origin used when building links sent by email.
    pub public_base_url: String,
    pub email_from: String,
}

impl Default for SetlistConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            youtube_api_key: None,
            youtube_api_base: DEFAULT_API_BASE.to_string(),
            webdriver_url: None,
            bandcamp_mode: BandcampMode::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
        }
    }
}

impl SetlistConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let bandcamp_mode = match get("BANDCAMP_MODE") {
            Some(raw) => raw.parse::<BandcampMode>().map_err(|message| ConfigError::Invalid {
                key: "BANDCAMP_MODE".into(),
                message,
            })?,
            None => defaults.bandcamp_mode,
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "HTTP_TIMEOUT_SECS".into(),
                        message: format!("expected a positive number of seconds, got {raw:?}"),
                    });
                }
            },
            None => defaults.http_timeout,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            youtube_api_key: get("YOUTUBE_API_KEY"),
            youtube_api_base: get("YOUTUBE_API_BASE_URL").unwrap_or(defaults.youtube_api_base),
            webdriver_url: get("WEBDRIVER_URL").or_else(|| get("SELENIUM_REMOTE_URL")),
            bandcamp_mode,
            http_timeout,
            public_base_url: get("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            email_from: get("EMAIL_FROM").unwrap_or(defaults.email_from),
        })
    }
}
