//! Configuration Module
//!
//! Construction parameters for a cache instance and the server settings
//! loaded from environment variables.

use std::env;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

/// Smallest accepted over-allocation factor for the index.
pub const MIN_CAP_FACTOR: f64 = 0.1;
/// Largest accepted over-allocation factor for the index.
pub const MAX_CAP_FACTOR: f64 = 3.0;

// == Config Error ==
/// Rejected construction parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid capacity {0}. It should be positive")]
    InvalidCapacity(usize),

    #[error("invalid capFactor {0}. It should be in [0.1, 3]")]
    InvalidCapFactor(f64),

    #[error("invalid ttl {0:?}. It should be positive and fit an Instant")]
    InvalidTtl(Duration),
}

// == Cache Config ==
/// Parameters fixed at cache construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheConfig {
    /// Hard ceiling on the number of live entries
    pub capacity: usize,
    /// Index over-allocation factor, in [0.1, 3.0]
    pub cap_factor: f64,
    /// Time to live applied to every write and successful read
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn new(capacity: usize, cap_factor: f64, ttl: Duration) -> Self {
        Self {
            capacity,
            cap_factor,
            ttl,
        }
    }

    /// Checks every parameter against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }
        // NaN fails both comparisons, so test for containment
        if !(MIN_CAP_FACTOR..=MAX_CAP_FACTOR).contains(&self.cap_factor) {
            return Err(ConfigError::InvalidCapFactor(self.cap_factor));
        }
        // Every deadline is `now + ttl`, which must stay representable
        if self.ttl.is_zero() || Instant::now().checked_add(self.ttl).is_none() {
            return Err(ConfigError::InvalidTtl(self.ttl));
        }
        Ok(())
    }

    /// Number of slots reserved up front: `ceil((1 + cap_factor) * capacity)`.
    pub fn reserved_capacity(&self) -> usize {
        ((1.0 + self.cap_factor) * self.capacity as f64).ceil() as usize
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            cap_factor: 0.2,
            ttl: Duration::from_secs(300),
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Parameters of the served cache
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl ServerConfig {
    /// Creates a new ServerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum live entries (default: 1000)
    /// - `CACHE_CAP_FACTOR` - Index over-allocation factor (default: 0.2)
    /// - `CACHE_TTL_SECS` - TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache: CacheConfig {
                capacity: parse_env("CACHE_CAPACITY").unwrap_or(defaults.cache.capacity),
                cap_factor: parse_env("CACHE_CAP_FACTOR").unwrap_or(defaults.cache.cap_factor),
                ttl: parse_env("CACHE_TTL_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.cache.ttl),
            },
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
