//! Predicates used by the routing table.

use crate::{AppConfig, ConfigError, RequestIdentity};

/// Host and path patterns resolved from configuration.
#[derive(Debug, Clone)]
pub struct RoutePatterns {
    pub app_origin: String,
    pub script_host: String,
    pub script_path_prefix: String,
    pub static_host_fragment: String,
    pub api_host_fragment: String,
    pub tile_path_fragment: String,
    pub api_path_fragment: String,
    pub exchange_host: String,
}

impl RoutePatterns {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let routing = &config.routing;
        Ok(Self {
            app_origin: config.origin_url()?.origin().ascii_serialization(),
            script_host: routing.script_host.to_ascii_lowercase(),
            script_path_prefix: routing.script_path_prefix.clone(),
            static_host_fragment: routing.static_host_fragment.to_ascii_lowercase(),
            api_host_fragment: routing.api_host_fragment.to_ascii_lowercase(),
            tile_path_fragment: routing.tile_path_fragment.clone(),
            api_path_fragment: routing.api_path_fragment.clone(),
            exchange_host: routing.exchange_host.to_ascii_lowercase(),
        })
    }
}

/// Predicate attached to a routing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Request origin equals the application origin.
    SameOrigin,
    /// Exact script host and script path prefix.
    ScriptLoader,
    /// `static host || (api host && tile path && !api path)`.
    Tile,
    /// Exact exchange-rate host.
    ExchangeHost,
    /// Hostname contains the API fragment.
    ApiHost,
}

impl Matcher {
    pub fn matches(self, request: &RequestIdentity, p: &RoutePatterns) -> bool {
        let host = request.hostname();
        let path = request.path();
        match self {
            Matcher::SameOrigin => request.origin() == p.app_origin,
            Matcher::ScriptLoader => host == p.script_host && path.starts_with(&p.script_path_prefix),
            Matcher::Tile => {
                host.contains(&p.static_host_fragment)
                    || (host.contains(&p.api_host_fragment)
                        && path.contains(&p.tile_path_fragment)
                        && !path.contains(&p.api_path_fragment))
            }
            Matcher::ExchangeHost => host == p.exchange_host,
            Matcher::ApiHost => host.contains(&p.api_host_fragment),
        }
    }
}
