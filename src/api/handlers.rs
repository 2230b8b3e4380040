//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::SimpleCache;
use crate::config::CacheConfig;
use crate::error::{BoxError, ReadError, Result};
use crate::models::{
    CleanResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
};

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Cache type served over HTTP: string keys, string values.
pub type ServedCache = SimpleCache<str, String>;

/// Key adapter for the server: keys are used as-is once they pass the
/// length checks.
pub fn http_key(key: &str) -> std::result::Result<String, BoxError> {
    if key.is_empty() {
        return Err("Key cannot be empty".into());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(format!("Key exceeds maximum length of {} bytes", MAX_KEY_LENGTH).into());
    }
    Ok(key.to_string())
}

/// Application state shared across all handlers.
///
/// The cache does its own locking, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ServedCache>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: ServedCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &CacheConfig) -> std::result::Result<Self, crate::config::ConfigError> {
        let cache = SimpleCache::from_config(config.clone(), http_key)?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache. Fails with 503 while the cache is
/// full of live entries.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let value = state.cache.insert_or_update(&req.key, req.value)?;

    Ok(Json(SetResponse::new(req.key, value)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value and slides its TTL. An expired entry answers 410 with
/// the stale value in the body.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> std::result::Result<Json<GetResponse>, ReadError<String>> {
    let value = state.cache.read(&key)?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /mru
///
/// Peeks at the most recently used entry without refreshing it.
pub async fn mru_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<GetResponse>, ReadError<GetResponse>> {
    match state.cache.most_recent() {
        Ok((key, value)) => Ok(Json(GetResponse::new(key, value))),
        Err(err) => Err(ReadError {
            error: err.error,
            stale: err.stale.map(|(key, value)| GetResponse::new(key, value)),
        }),
    }
}

/// Handler for GET /stats
///
/// Returns a snapshot of the cache counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.snapshot().into())
}

/// Handler for POST /clean
///
/// Drops every entry and resets the counters.
pub async fn clean_handler(State(state): State<AppState>) -> Json<CleanResponse> {
    state.cache.clean();
    Json(CleanResponse::new())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
