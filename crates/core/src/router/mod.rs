//! Request classification.
//!
//! The router maps an intercepted request to a region and strategy, or
//! declines to intercept. Rules are an ordered table evaluated top to bottom;
//! the first matching rule wins. Non-GET requests never reach the table.

pub mod rules;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::{AppConfig, ConfigError, RequestIdentity};
use rules::{Matcher, RoutePatterns};

/// Caching strategy applied to a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Strategy {
    /// Serve from the region, fall back to the network and populate.
    CacheFirst,
    /// Cache-first, trimming the region to `max_entries` after each write-back.
    CacheFirstBounded { max_entries: usize },
    /// Serve the region copy immediately and refresh it from the network.
    StaleWhileRevalidate,
    /// Fetch first, fall back to the region when the network fails.
    NetworkFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::CacheFirst => f.write_str("cache-first"),
            Strategy::CacheFirstBounded { max_entries } => write!(f, "cache-first(max={max_entries})"),
            Strategy::StaleWhileRevalidate => f.write_str("stale-while-revalidate"),
            Strategy::NetworkFirst => f.write_str("network-first"),
        }
    }
}

/// Routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Leave the request to default network handling.
    PassThrough,
    /// Handle the request with `strategy` against `region`.
    Dispatch { rule: &'static str, region: String, strategy: Strategy },
}

/// One row of the routing table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub region: String,
    pub strategy: Strategy,
    matcher: Matcher,
}

impl Rule {
    /// Whether this rule's predicate accepts the request.
    pub fn matches(&self, request: &RequestIdentity, patterns: &RoutePatterns) -> bool {
        self.matcher.matches(request, patterns)
    }
}

/// First-match-wins request classifier.
#[derive(Debug, Clone)]
pub struct Router {
    patterns: Arc<RoutePatterns>,
    rules: Vec<Rule>,
}

impl Router {
    /// Build the routing table from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the application origin does not parse.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let patterns = RoutePatterns::from_config(config)?;
        let regions = &config.regions;

        let rules = vec![
            Rule {
                name: "shell",
                region: regions.shell.clone(),
                strategy: Strategy::CacheFirst,
                matcher: Matcher::SameOrigin,
            },
            Rule {
                name: "dynamic-script",
                region: regions.shell.clone(),
                strategy: Strategy::StaleWhileRevalidate,
                matcher: Matcher::ScriptLoader,
            },
            Rule {
                name: "tiles",
                region: regions.tiles.clone(),
                strategy: Strategy::CacheFirstBounded { max_entries: regions.tile_limit },
                matcher: Matcher::Tile,
            },
            Rule {
                name: "exchange-rates",
                region: regions.api.clone(),
                strategy: Strategy::NetworkFirst,
                matcher: Matcher::ExchangeHost,
            },
            Rule {
                name: "api",
                region: regions.api.clone(),
                strategy: Strategy::NetworkFirst,
                matcher: Matcher::ApiHost,
            },
        ];

        Ok(Self { patterns: Arc::new(patterns), rules })
    }

    /// Classify a request.
    pub fn classify(&self, request: &RequestIdentity) -> Route {
        if !request.is_get() {
            return Route::PassThrough;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(request, &self.patterns))
            .map(|rule| Route::Dispatch { rule: rule.name, region: rule.region.clone(), strategy: rule.strategy })
            .unwrap_or(Route::PassThrough)
    }

    /// The routing table in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
