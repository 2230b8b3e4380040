//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheState;

/// Response body for GET /get/:key and GET /mru
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// The value now cached under the key
    pub value: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            value: value.into(),
        }
    }
}

/// Response body for the reset operation (POST /clean)
#[derive(Debug, Clone, Serialize)]
pub struct CleanResponse {
    pub message: String,
}

impl CleanResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleaned".to_string(),
        }
    }
}

impl Default for CleanResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// TTL applied to every entry, in seconds
    pub ttl_secs: f64,
    /// Maximum number of live entries
    pub capacity: usize,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheState> for StatsResponse {
    fn from(state: CacheState) -> Self {
        Self {
            hits: state.hit_count,
            misses: state.miss_count,
            ttl_secs: state.ttl.as_secs_f64(),
            capacity: state.capacity,
            total_entries: state.num_entries,
            hit_rate: state.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "test_value");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("test_value"));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key", "my_value");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_stats_response_from_state() {
        let resp = StatsResponse::from(CacheState {
            miss_count: 20,
            hit_count: 80,
            ttl: Duration::from_millis(1500),
            capacity: 100,
            num_entries: 42,
        });
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.ttl_secs, 1.5);
        assert_eq!(resp.total_entries, 42);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
