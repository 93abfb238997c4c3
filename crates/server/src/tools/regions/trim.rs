//! region_trim tool implementation.
//!
//! Applies the oldest-insertion eviction policy to a region, or deletes the
//! region outright.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use waypost_client::trim_region;
use waypost_core::{Region, RegionBackend};

use super::ensure_region;
use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the region_trim tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegionTrimParams {
    pub region: String,

    /// Keep only the newest N entries.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Delete the whole region instead of trimming it.
    #[serde(default)]
    pub delete: bool,
}

/// Output from the region_trim tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegionTrimOutput {
    pub region: String,
    /// Entries removed by trimming.
    pub evicted: u64,
    pub region_deleted: bool,
    pub remaining: u64,
}

/// Implementation of the region_trim tool.
pub async fn trim_impl(backend: Arc<dyn RegionBackend>, params: RegionTrimParams) -> Result<CallToolResult, McpError> {
    if !params.delete && params.max_entries.is_none() {
        return Err(ToolError::InvalidInput("one of max_entries or delete must be specified".into()).into());
    }
    ensure_region(backend.as_ref(), &params.region).await?;

    let output = if params.delete {
        let remaining = backend.count(&params.region).await?;
        let region_deleted = backend.delete_region(&params.region).await?;
        tracing::info!(region = %params.region, "region deleted");
        RegionTrimOutput { region: params.region, evicted: remaining, region_deleted, remaining: 0 }
    } else {
        let region = Region::new(backend, params.region.clone());
        let evicted = trim_region(&region, params.max_entries.unwrap_or_default()).await?;
        let remaining = region.count().await?;
        RegionTrimOutput { region: params.region, evicted, region_deleted: false, remaining }
    };

    Ok(json_result(&output)?)
}
