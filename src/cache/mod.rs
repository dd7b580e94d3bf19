//! Cache-aside layer for catalog reads.
//!
//! The cache is an optimization, never a correctness dependency: every
//! read path must survive a failing or empty cache by falling through to
//! the persistent store.

pub mod keys;
pub mod store;

pub use store::{CacheError, CacheStore, MemoryCache};
