//! region_list tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waypost_core::{AppConfig, RegionBackend};

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegionSummary {
    pub name: String,
    pub entries: u64,
    /// Whether the region belongs to the current region set. Regions outside
    /// it are deleted on the next activation.
    pub current: bool,
}

/// Output from the region_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegionListOutput {
    pub regions: Vec<RegionSummary>,
}

/// Implementation of the region_list tool.
pub async fn list_impl(backend: &dyn RegionBackend, config: &AppConfig) -> Result<CallToolResult, McpError> {
    let current = config.region_set();
    let mut regions = Vec::new();
    for name in backend.region_names().await? {
        let entries = backend.count(&name).await?;
        let in_set = current.contains(&name);
        regions.push(RegionSummary { name, entries, current: in_set });
    }

    Ok(json_result(&RegionListOutput { regions })?)
}
