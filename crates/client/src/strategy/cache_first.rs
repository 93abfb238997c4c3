//! Cache-first, optionally bounded.

use waypost_core::{Error, RequestIdentity};

use super::{Served, Source, StrategyContext, lookup, no_fallback, schedule_write_back};

/// Serve from the region; on a miss fetch, store in the background, and return
/// the network response.
///
/// When the network fails, `offline_document` (if any) is served from the
/// region instead. `max_entries` bounds the region after each write-back.
pub async fn cache_first(
    ctx: &StrategyContext, request: &RequestIdentity, offline_document: Option<&RequestIdentity>,
    max_entries: Option<usize>,
) -> Result<Served, Error> {
    if let Some(hit) = lookup(&ctx.region, request).await {
        tracing::debug!(region = ctx.region.name(), "cache hit for {request}");
        return Ok(Served::new(hit, Source::Cache, None));
    }

    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            let write_back = schedule_write_back(ctx, request, &response, max_entries);
            Ok(Served::new(response, Source::Network, write_back))
        }
        Err(err) => {
            if let Some(document) = offline_document
                && let Some(fallback) = lookup(&ctx.region, document).await
            {
                tracing::info!("network failed for {request}, serving offline document: {err}");
                return Ok(Served::new(fallback, Source::Offline, None));
            }
            Err(no_fallback(request, &err))
        }
    }
}
