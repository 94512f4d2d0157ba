//! Client code for swcache.
//!
//! This crate provides the live HTTP side of the offline cache: a
//! [`Network`](swcache_core::Network) implementation on top of reqwest.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork};
