//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response model of intercepted fetches
//! - Versioned cache buckets with SQLite and in-memory backends
//! - The offline asset cache controller (install, activate, fetch)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod network;
pub mod origin;
pub mod request;

pub use cache::{BucketName, CacheStorage, CachedEntry, MemoryStorage, SqliteStorage};
pub use config::AppConfig;
pub use controller::{
    ActivateReport, ControllerSettings, ControllerState, ControllerStatus, FetchOutcome, InstallReport,
    OfflineController, ResponseSource,
};
pub use error::Error;
pub use network::{Network, StaticNetwork};
pub use request::{CacheMode, CacheRequest, CacheResponse, Destination, RequestMode};
