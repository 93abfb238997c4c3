//! Region inspection and maintenance tools.
//!
//! These operate on the region store directly and never touch the network.

pub mod keys;
pub mod list;
pub mod trim;

pub use keys::{RegionKeysParams, keys_impl};
pub use list::list_impl;
pub use trim::{RegionTrimParams, trim_impl};

use rmcp::ErrorData as McpError;
use waypost_core::RegionBackend;

use crate::error::ToolError;

/// Fail with `UnknownRegion` unless `name` is persisted in the store.
pub(crate) async fn ensure_region(backend: &dyn RegionBackend, name: &str) -> Result<(), McpError> {
    let names = backend.region_names().await?;
    if names.iter().any(|existing| existing == name) {
        Ok(())
    } else {
        Err(ToolError::UnknownRegion(name.to_string()).into())
    }
}
