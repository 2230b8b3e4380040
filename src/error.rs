//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Boxed error produced by caller-supplied hooks (key adapter, value codec).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The key adapter rejected the supplied key. Carries the adapter's error unchanged.
    #[error("{0}")]
    KeyAdaptation(BoxError),

    /// The value codec failed to encode or decode a value
    #[error("value codec failed: {0}")]
    Codec(BoxError),

    /// Capacity reached and the least recently used entry is still live
    #[error("cache is full")]
    CacheFull,

    /// Key not present in the index
    #[error("key {0} not found")]
    NotFound(String),

    /// Key present but its TTL has elapsed
    #[error("key {0} found but ttl expired")]
    Expired(String),

    /// Peek on a cache with no entries
    #[error("empty cache")]
    EmptyCache,

    /// Most recently used entry is stale
    #[error("MRU entry {0} has expired")]
    MruExpired(String),

    /// Snapshot could not be rendered
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    fn status_code(&self) -> StatusCode {
        match self {
            CacheError::KeyAdaptation(_) => StatusCode::BAD_REQUEST,
            CacheError::CacheFull => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::NotFound(_) | CacheError::EmptyCache => StatusCode::NOT_FOUND,
            CacheError::Expired(_) | CacheError::MruExpired(_) => StatusCode::GONE,
            CacheError::Codec(_) | CacheError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == Read Error ==
/// Failure of a value-returning lookup.
///
/// `Expired` and `MruExpired` hand back the stale payload in `stale` so the
/// caller can still inspect it; every other failure leaves it `None`.
#[derive(Debug)]
pub struct ReadError<V> {
    pub error: CacheError,
    pub stale: Option<V>,
}

impl<V> ReadError<V> {
    pub(crate) fn stale(error: CacheError, value: V) -> Self {
        Self {
            error,
            stale: Some(value),
        }
    }

    /// Discards the stale payload, keeping only the failure.
    pub fn into_error(self) -> CacheError {
        self.error
    }
}

impl<V> From<CacheError> for ReadError<V> {
    fn from(error: CacheError) -> Self {
        Self { error, stale: None }
    }
}

impl<V> fmt::Display for ReadError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<V: fmt::Debug> std::error::Error for ReadError<V> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (self.status_code(), body).into_response()
    }
}

impl<V: Serialize> IntoResponse for ReadError<V> {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = match self.stale {
            Some(stale) => Json(json!({
                "error": self.error.to_string(),
                "stale": stale,
            })),
            None => Json(json!({
                "error": self.error.to_string()
            })),
        };

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
