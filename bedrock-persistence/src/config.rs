//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (prefix: BEDROCK_)
//! 2. Current working directory: ./bedrock.toml
//! 3. Default values
//!
//! The paging defaults here are request-scoped data: callers copy them into
//! per-call parameters rather than reading shared mutable state.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{PersistenceError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Paging defaults
    #[serde(default)]
    pub paging: PagingConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            paging: PagingConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Paging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Page size used when a caller does not supply one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound applied to caller-supplied page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl PagingConfig {
    /// Clamp a caller-supplied page size to the configured bounds
    ///
    /// A size of zero falls back to the default.
    pub fn clamp_size(&self, size: u32) -> u32 {
        if size == 0 {
            self.default_page_size
        } else {
            size.min(self.max_page_size)
        }
    }
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PersistenceConfig {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        Self::figment()
            .extract()
            .map_err(|e| PersistenceError::Configuration(e.to_string()))
    }

    /// Build the layered figment without extracting
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("bedrock.toml"))
            .merge(Env::prefixed("BEDROCK_").split("__"))
    }
}

/// Initialize tracing with JSON formatting and an env-filter built from the
/// configured log level
pub fn init_tracing(config: &PersistenceConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| PersistenceError::Configuration(e.to_string()))?;

    tracing::info!("Tracing initialized");

    Ok(())
}
