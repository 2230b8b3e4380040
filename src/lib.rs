//! Simple Cache - A fixed-capacity in-process TTL cache
//!
//! Entries are kept in LRU order and expire after a fixed TTL that slides on
//! every successful read. A full cache only admits a new key by evicting an
//! already expired entry; it never drops live data.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{keys, CacheState, SimpleCache};
pub use config::{CacheConfig, ServerConfig};
pub use error::{CacheError, ReadError};
