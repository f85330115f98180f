//! Client configuration.
//!
//! Resolves the API endpoint, request timeout, probe cadence, and page size used
//! by the CLI (and any other front-end) from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for talking to the listings API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Applied to every remote call, probes included
    pub request_timeout: Duration,
    /// Cadence of the background reconnect monitor
    pub probe_interval: Duration,
    /// `limit` used when paging through `GET /listings`
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(5),
            probe_interval: Duration::from_secs(15),
            page_size: 100,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = normalize_api_url(&value_or_default(
            &lookup,
            "RENTALS_API_URL",
            DEFAULT_API_URL,
        ))
        .map_err(|ConfigError::Invalid(message)| {
            ConfigError::Invalid(format!("RENTALS_API_URL: {message}"))
        })?;

        let timeout_secs = parse_in_range(&lookup, "RENTALS_REQUEST_TIMEOUT_SECS", "5", 1, 120)?;
        let probe_secs = parse_in_range(&lookup, "RENTALS_PROBE_INTERVAL_SECS", "15", 1, 3_600)?;
        let page_size = parse_in_range(&lookup, "RENTALS_PAGE_SIZE", "100", 1, 1_000)?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            probe_interval: Duration::from_secs(probe_secs),
            page_size: usize::try_from(page_size)
                .map_err(|_| ConfigError::Invalid("RENTALS_PAGE_SIZE is too large".to_string()))?,
        })
    }

    /// Replace the API base URL, validating it the same way the env value is.
    pub fn with_api_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_api_url(url)?;
        Ok(self)
    }
}

/// Trim the URL, require an http(s) scheme, and drop trailing slashes.
pub fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let url = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| ConfigError::Invalid("API URL must not be empty".to_string()))?;
    if !is_http_url(&url) {
        return Err(ConfigError::Invalid(
            "API URL must start with http:// or https://".to_string(),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_in_range(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let value = value_or_default(lookup, name, default)
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(format!("{name} must be an integer in [{min}, {max}]")))?;
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be in [{min}, {max}]"
        )));
    }
    Ok(value)
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    normalize_text_option(lookup(name)).unwrap_or_else(|| default.to_string())
}
