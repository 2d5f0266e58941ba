//! Cache system for boltdesk
//!
//! Fleet-wide bolt queries are slow, so their results are kept in memory:
//! - `TtlCache`: a keyed map whose entries expire after a fixed TTL
//! - `ExecutionCache`: the inventory, per-node facts and task catalog caches
//!
//! Expired entries are dropped lazily on the next read; there is no sweeper.

pub mod entry;
pub mod execution;
pub mod ttl;

pub use entry::{CacheEntry, CacheStats};
pub use execution::{ExecutionCache, ExecutionCacheStats};
pub use ttl::TtlCache;
