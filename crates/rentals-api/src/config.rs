use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_PAGE_SIZE: usize = 5;
const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Seed the demo listings at startup
    pub seed_demo: bool,
    /// `limit` used when only `page` is given
    pub default_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            seed_demo: true,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "RENTALS_API_BIND_ADDR", DEFAULT_BIND_ADDR);
        if bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "RENTALS_API_BIND_ADDR must be a socket address like {DEFAULT_BIND_ADDR}, got {bind_addr}"
            )));
        }

        let seed_demo = parse_bool(&value_or_default(&lookup, "RENTALS_API_SEED_DEMO", "true"))
            .ok_or_else(|| {
                ConfigError::Invalid("RENTALS_API_SEED_DEMO must be true or false".to_string())
            })?;

        let default_page_size = value_or_default(
            &lookup,
            "RENTALS_API_DEFAULT_PAGE_SIZE",
            &DEFAULT_PAGE_SIZE.to_string(),
        )
        .parse::<usize>()
        .map_err(|_| {
            ConfigError::Invalid("RENTALS_API_DEFAULT_PAGE_SIZE must be an integer".to_string())
        })?;
        if !(1..=MAX_PAGE_SIZE).contains(&default_page_size) {
            return Err(ConfigError::Invalid(format!(
                "RENTALS_API_DEFAULT_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(Self {
            bind_addr,
            seed_demo,
            default_page_size,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
