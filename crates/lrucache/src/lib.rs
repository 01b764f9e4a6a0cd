//! # lrucache
//!
//! Fixed-capacity in-memory cache with least-recently-used eviction.
//!
//! ## Architecture
//! - **Index**: AHash map from key to entry handle (O(1) lookup)
//! - **Order list**: arena-backed doubly-linked list in recency order
//!   (O(1) promote, append and evict)
//! - **Stats**: hit/miss/insert/update/eviction counters
//!
//! Every `get` and `set` goes through the index first, then reorders the list.
//! Eviction takes the key stored in the evicted entry and deletes exactly that
//! key from the index.
//!
//! The cache is single-threaded: recency-changing operations take `&mut self`.

#![warn(missing_docs)]

mod cache;
mod error;
mod order;
mod stats;

pub use cache::{LruCache, DEFAULT_CAPACITY};
pub use error::{Error, Result};
pub use order::Iter;
pub use stats::CacheStats;
