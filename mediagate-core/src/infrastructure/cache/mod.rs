//! Response caching
//!
//! In-process TTL cache shared by every endpoint, plus the key builders that
//! give each endpoint its own namespace.

pub mod keys;
pub mod response_cache;

pub use response_cache::ResponseCache;
