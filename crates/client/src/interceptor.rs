//! Per-request entry point for the host.
//!
//! The interceptor classifies a request, runs the chosen strategy against the
//! chosen region, and tracks the write-backs it triggers. Pass-through
//! requests touch neither the network nor any region here; the host forwards
//! them itself.

use std::sync::Arc;

use waypost_core::{AppConfig, Error, Region, RegionBackend, RequestIdentity, Route, Router, Strategy};

use crate::fetch::{Fetch, resolve_manifest_path};
use crate::strategy::{Served, StrategyContext, execute};
use crate::writeback::WriteBacks;

/// Result of intercepting one request.
#[derive(Debug)]
pub enum Interception {
    /// The request is not ours; hand it to default network handling.
    PassThrough,
    /// The request was answered by a strategy.
    Handled { rule: &'static str, region: String, strategy: Strategy, served: Served },
}

/// Router + strategy executor over a region backend and a fetch capability.
pub struct Interceptor {
    router: Router,
    backend: Arc<dyn RegionBackend>,
    fetcher: Arc<dyn Fetch>,
    writes: WriteBacks,
    shell_region: String,
    offline_document: Option<RequestIdentity>,
}

impl Interceptor {
    /// Build an interceptor from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the origin or offline document path is invalid.
    pub fn new(config: &AppConfig, backend: Arc<dyn RegionBackend>, fetcher: Arc<dyn Fetch>) -> Result<Self, Error> {
        let router = Router::new(config).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let offline_document = config
            .offline_document
            .as_deref()
            .map(|path| resolve_manifest_path(&origin, path).map(RequestIdentity::get))
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("offline_document: {e}")))?;

        Ok(Self {
            router,
            backend,
            fetcher,
            writes: WriteBacks::new(),
            shell_region: config.regions.shell.clone(),
            offline_document,
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn backend(&self) -> &Arc<dyn RegionBackend> {
        &self.backend
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetch> {
        &self.fetcher
    }

    /// Handle for a region by name.
    pub fn region(&self, name: &str) -> Region {
        Region::new(self.backend.clone(), name.to_string())
    }

    /// Intercept one request.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoFallbackAvailable` when neither the region, the
    /// network, nor the offline document can answer.
    pub async fn handle(&self, request: &RequestIdentity) -> Result<Interception, Error> {
        let Route::Dispatch { rule, region, strategy } = self.router.classify(request) else {
            tracing::trace!("passing through {request}");
            return Ok(Interception::PassThrough);
        };

        tracing::debug!(rule, region = %region, %strategy, "intercepting {request}");

        let ctx = StrategyContext {
            region: self.region(&region),
            fetcher: self.fetcher.clone(),
            writes: self.writes.clone(),
            offline_document: if region == self.shell_region { self.offline_document.clone() } else { None },
        };

        let served = execute(strategy, &ctx, request).await?;
        Ok(Interception::Handled { rule, region, strategy, served })
    }

    /// Number of write-backs and revalidations still running.
    pub fn pending_writes(&self) -> usize {
        self.writes.pending()
    }

    /// Wait for every outstanding write-back. The response path never calls this.
    pub async fn settle(&self) {
        self.writes.settle().await;
    }
}
