//! relay_fetch tool implementation.
//!
//! Runs one request through the interceptor. Requests the router does not
//! claim are forwarded to the network as-is. The tool carries no request
//! body, so only body-less methods are accepted.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waypost_client::fetch::parse_absolute;
use waypost_client::{Interception, Interceptor, Source};
use waypost_core::{Error, RequestIdentity, ResponseSnapshot};

use super::json_result;
use crate::error::ToolError;

/// Methods that can be relayed without a request body.
const BODYLESS_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS"];

/// Input parameters for the relay_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelayFetchParams {
    /// The absolute URL to request.
    pub url: String,

    /// HTTP method (default: GET). One of GET, HEAD, OPTIONS; only GET is
    /// ever intercepted.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the relay_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelayFetchOutput {
    pub url: String,
    pub method: String,
    /// Name of the matching rule, or `pass_through`.
    pub route: String,
    pub region: Option<String>,
    pub strategy: Option<String>,
    /// `cache`, `network`, or `offline`.
    pub source: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub captured_at: String,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
}

impl RelayFetchOutput {
    fn new(request: &RequestIdentity, route: &str, snapshot: &ResponseSnapshot, source: &str) -> Self {
        Self {
            url: request.url().to_string(),
            method: request.method().to_string(),
            route: route.to_string(),
            region: None,
            strategy: None,
            source: source.to_string(),
            status: snapshot.status,
            content_type: snapshot.content_type().map(str::to_string),
            captured_at: snapshot.captured_at.clone(),
            body: String::from_utf8_lossy(&snapshot.body).into_owned(),
        }
    }
}

fn source_name(source: Source) -> &'static str {
    match source {
        Source::Cache => "cache",
        Source::Network => "network",
        Source::Offline => "offline",
    }
}

/// Implementation of the relay_fetch tool.
pub async fn relay_impl(interceptor: &Interceptor, params: RelayFetchParams) -> Result<CallToolResult, McpError> {
    let method = params.method.trim().to_ascii_uppercase();
    if !BODYLESS_METHODS.contains(&method.as_str()) {
        return Err(ToolError::InvalidInput(format!("unsupported method {method}: requests carry no body")).into());
    }
    let url = parse_absolute(&params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let request = RequestIdentity::new(method, url);

    let output = match interceptor.handle(&request).await? {
        Interception::PassThrough => {
            let snapshot = interceptor.fetcher().fetch(&request).await?;
            RelayFetchOutput::new(&request, "pass_through", &snapshot, "network")
        }
        Interception::Handled { rule, region, strategy, served } => RelayFetchOutput {
            region: Some(region),
            strategy: Some(strategy.to_string()),
            ..RelayFetchOutput::new(&request, rule, &served.snapshot, source_name(served.source))
        },
    };

    tracing::debug!(route = %output.route, source = %output.source, status = output.status, "relayed {request}");
    Ok(json_result(&output)?)
}
