//! Interception pipeline for waypost.
//!
//! This crate provides the network fetch capability, the caching strategies,
//! the eviction policy, and the install/activate lifecycle used by the server.

pub mod eviction;
pub mod fetch;
pub mod interceptor;
pub mod lifecycle;
pub mod strategy;
pub mod writeback;

#[cfg(test)]
pub(crate) mod test_support;

pub use eviction::trim_region;
pub use fetch::{Fetch, FetchConfig, HttpFetcher};
pub use interceptor::{Interception, Interceptor};
pub use lifecycle::{ActivationReport, ClientRegistry, InstallReport, Lifecycle, Phase};
pub use strategy::{Served, Source, StrategyContext};
pub use writeback::{WriteBack, WriteBacks};
