//! Strategy executor.
//!
//! Each strategy maps `(request, region, fetch capability)` to a served
//! response. Write-backs are detached: the served response carries a
//! completion signal but the strategy never waits on it.
//!
//! Failure policy:
//! - a failed lookup is logged and treated as a miss
//! - a failed write-back is logged and dropped
//! - a network failure falls back to the region (or offline document) when
//!   the strategy defines a fallback, and surfaces as `NoFallbackAvailable`
//!   otherwise

pub mod cache_first;
pub mod network_first;
pub mod revalidate;

use std::sync::Arc;

use serde::Serialize;
use waypost_core::{Error, Region, RequestIdentity, ResponseSnapshot, Strategy};

use crate::eviction::trim_region;
use crate::fetch::Fetch;
use crate::writeback::{WriteBack, WriteBacks};

pub use cache_first::cache_first;
pub use network_first::network_first;
pub use revalidate::stale_while_revalidate;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Network,
    Offline,
}

/// A response produced by a strategy.
#[derive(Debug)]
pub struct Served {
    pub snapshot: ResponseSnapshot,
    pub source: Source,
    /// Pending write-back or revalidation triggered by this request.
    pub write_back: Option<WriteBack>,
}

impl Served {
    fn new(snapshot: ResponseSnapshot, source: Source, write_back: Option<WriteBack>) -> Self {
        Self { snapshot, source, write_back }
    }
}

/// Everything a strategy needs besides the request.
#[derive(Clone)]
pub struct StrategyContext {
    pub region: Region,
    pub fetcher: Arc<dyn Fetch>,
    pub writes: WriteBacks,
    /// Identity of the offline document, when this region serves one.
    pub offline_document: Option<RequestIdentity>,
}

/// Run `strategy` for `request`.
pub async fn execute(strategy: Strategy, ctx: &StrategyContext, request: &RequestIdentity) -> Result<Served, Error> {
    match strategy {
        Strategy::CacheFirst => cache_first(ctx, request, ctx.offline_document.as_ref(), None).await,
        Strategy::CacheFirstBounded { max_entries } => cache_first(ctx, request, None, Some(max_entries)).await,
        Strategy::StaleWhileRevalidate => stale_while_revalidate(ctx, request).await,
        Strategy::NetworkFirst => network_first(ctx, request).await,
    }
}

/// Look up an identity, treating store failures as a miss.
pub(crate) async fn lookup(region: &Region, identity: &RequestIdentity) -> Option<ResponseSnapshot> {
    match region.get(identity).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(region = region.name(), "lookup for {identity} failed, treating as miss: {e}");
            None
        }
    }
}

/// Persist an ok response in the background, trimming afterwards when bounded.
///
/// Non-ok responses are served but never stored.
pub(crate) fn schedule_write_back(
    ctx: &StrategyContext, identity: &RequestIdentity, response: &ResponseSnapshot, max_entries: Option<usize>,
) -> Option<WriteBack> {
    if !response.is_ok() {
        tracing::debug!(status = response.status, "not storing {identity}");
        return None;
    }

    let region = ctx.region.clone();
    let identity = identity.clone();
    let snapshot = response.clone();
    Some(ctx.writes.spawn(async move { persist(&region, &identity, &snapshot, max_entries).await }))
}

pub(crate) async fn persist(
    region: &Region, identity: &RequestIdentity, snapshot: &ResponseSnapshot, max_entries: Option<usize>,
) {
    if let Err(e) = region.put(identity, snapshot).await {
        tracing::warn!(region = region.name(), "write-back for {identity} dropped: {e}");
        return;
    }
    if let Some(max) = max_entries
        && let Err(e) = trim_region(region, max).await
    {
        tracing::warn!(region = region.name(), "eviction after write-back failed: {e}");
    }
}

pub(crate) fn no_fallback(request: &RequestIdentity, cause: &Error) -> Error {
    Error::NoFallbackAvailable(format!("{request}: {cause}"))
}
