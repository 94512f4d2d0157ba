//! Versioned cache buckets.
//!
//! A bucket maps request identity (method + resolved URL) to a stored
//! response. Two stores implement [`CacheStorage`]:
//!
//! - [`SqliteStorage`]: persistent, WAL mode, versioned migrations
//! - [`MemoryStorage`]: process memory, used as the test fake

pub mod buckets;
pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod naming;
pub mod storage;

pub use crate::Error;

pub use connection::SqliteStorage;
pub use memory::MemoryStorage;
pub use naming::BucketName;
pub use storage::{CacheStorage, CachedEntry};
