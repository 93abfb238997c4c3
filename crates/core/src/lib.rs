//! Core types and shared functionality for waypost.
//!
//! This crate provides:
//! - Region store with SQLite backend
//! - Request/response model used as cache identity and stored snapshot
//! - Request classification (router)
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod request;
pub mod router;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{RequestIdentity, ResponseSnapshot};
pub use router::{Route, Router, Strategy};
pub use store::{Region, RegionBackend, RegionDb};
