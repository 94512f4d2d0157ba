//! Bucket inspection tools.

pub mod list;
pub mod purge;

pub use list::{CacheListParams, list_impl};
pub use purge::{CachePurgeParams, purge_impl};
