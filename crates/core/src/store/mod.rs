//! Named cache regions backed by SQLite.
//!
//! Each region is an independently lifecycled key-value store mapping a
//! request identity to a response snapshot. Entries keep the order they were
//! written in, which is the only ordering the eviction policy uses.
//!
//! - `RegionBackend`: async storage seam used by strategies and lifecycle
//! - `RegionDb`: SQLite implementation (WAL mode, automatic migrations)
//! - `Region`: cheap handle binding a backend to one region name

pub mod backend;
pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use backend::{Region, RegionBackend};
pub use connection::RegionDb;
