//! region_keys tool implementation.
//!
//! Lists the entries of one region, oldest insertion first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waypost_core::RegionBackend;

use super::ensure_region;
use crate::tools::json_result;

/// Parameters for the region_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegionKeysParams {
    /// Region name, e.g. `map-tiles-v1`.
    pub region: String,
}

/// Output from the region_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegionKeysOutput {
    pub region: String,
    /// Entry URLs in insertion order.
    pub keys: Vec<String>,
}

/// Implementation of the region_keys tool.
pub async fn keys_impl(backend: &dyn RegionBackend, params: RegionKeysParams) -> Result<CallToolResult, McpError> {
    ensure_region(backend, &params.region).await?;

    let keys = backend
        .keys(&params.region)
        .await?
        .iter()
        .map(|identity| identity.url().to_string())
        .collect();

    Ok(json_result(&RegionKeysOutput { region: params.region, keys })?)
}
