//! Cache Module
//!
//! Fixed-capacity in-memory cache with TTL expiration, LRU ordering and
//! non-destructive admission.

pub mod codec;
mod entry;
pub mod keys;
mod list;
mod stats;
mod store;


// Re-export public types
pub use codec::ValueCodec;
pub use entry::SlotState;
pub use stats::CacheState;
pub use store::{CacheGuard, Entries, EntryView, SimpleCache};
