use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Default flow expiry window: two hours
pub const DEFAULT_FLOW_ID_EXPIRY_MS: i64 = 2 * 60 * 60 * 1000;

/// Default namespace applied to every flow context cache key
pub const DEFAULT_CACHE_PREFIX: &str = "flow-context~";

/// Default lifetime of a cached flow context: 24 hours
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Flow context configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign flow identifiers
    pub flow_id_key: String,
    /// How long a flow stays valid after it began, in milliseconds
    pub flow_id_expiry_ms: i64,
    pub cache_prefix: String,
    /// Cached context lifetime, measured from the last write
    pub cache_ttl: Duration,
}

impl Config {
    /// Build a config with default expiry and cache settings
    pub fn new(flow_id_key: impl Into<String>) -> Self {
        Self {
            flow_id_key: flow_id_key.into(),
            flow_id_expiry_ms: DEFAULT_FLOW_ID_EXPIRY_MS,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_flow_id_expiry_ms(mut self, expiry_ms: i64) -> Self {
        self.flow_id_expiry_ms = expiry_ms;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            flow_id_key: env::var("FLOW_ID_KEY").context("FLOW_ID_KEY must be set")?,
            flow_id_expiry_ms: env::var("FLOW_ID_EXPIRY_MS")
                .unwrap_or_else(|_| DEFAULT_FLOW_ID_EXPIRY_MS.to_string())
                .parse()
                .context("FLOW_ID_EXPIRY_MS must be a valid number")?,
            cache_prefix: env::var("FLOW_CACHE_PREFIX")
                .unwrap_or_else(|_| DEFAULT_CACHE_PREFIX.to_string()),
            cache_ttl: env::var("FLOW_CACHE_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_CACHE_TTL.as_secs().to_string())
                .parse()
                .map(Duration::from_secs)
                .context("FLOW_CACHE_TTL_SECS must be a valid number")?,
        })
    }
}
