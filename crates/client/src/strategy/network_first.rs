//! Network-first with region fallback.

use waypost_core::{Error, RequestIdentity};

use super::{Served, Source, StrategyContext, lookup, no_fallback, schedule_write_back};

/// Always try the network; store ok responses; fall back to the region when
/// the fetch fails.
///
/// Responses of any status are returned to the caller. Only network failure
/// (not an error status) triggers the fallback.
pub async fn network_first(ctx: &StrategyContext, request: &RequestIdentity) -> Result<Served, Error> {
    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            let write_back = schedule_write_back(ctx, request, &response, None);
            Ok(Served::new(response, Source::Network, write_back))
        }
        Err(err) => match lookup(&ctx.region, request).await {
            Some(hit) => {
                tracing::debug!(region = ctx.region.name(), "network failed for {request}, serving cached copy: {err}");
                Ok(Served::new(hit, Source::Cache, None))
            }
            None => Err(no_fallback(request, &err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::execute;
    use crate::test_support::{ScriptedFetcher, get, snapshot};
    use crate::writeback::WriteBacks;
    use std::sync::Arc;
    use waypost_core::{Region, RegionBackend, RegionDb, Strategy};

    const RATES: &str = "https://open.er-api.com/v6/latest/JPY";

    async fn context(fetcher: Arc<ScriptedFetcher>) -> StrategyContext {
        let backend: Arc<dyn RegionBackend> = Arc::new(RegionDb::open_in_memory().await.unwrap());
        StrategyContext {
            region: Region::open(backend, "api-v1").await.unwrap(),
            fetcher,
            writes: WriteBacks::new(),
            offline_document: None,
        }
    }

    #[tokio::test]
    async fn test_network_response_wins_over_cache() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(RATES, 200, r#"{"rate":2}"#);
        let ctx = context(fetcher.clone()).await;
        ctx.region.put(&get(RATES), &snapshot(RATES, r#"{"rate":1}"#)).await.unwrap();

        let served = execute(Strategy::NetworkFirst, &ctx, &get(RATES)).await.unwrap();
        assert_eq!(served.source, Source::Network);
        assert_eq!(served.snapshot.body.as_ref(), br#"{"rate":2}"#);

        served.write_back.unwrap().done().await;
        let stored = ctx.region.get(&get(RATES)).await.unwrap().unwrap();
        assert_eq!(stored.body.as_ref(), br#"{"rate":2}"#);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_cache() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.fail(RATES);
        let ctx = context(fetcher).await;
        let prior = snapshot(RATES, r#"{"rate":1}"#);
        ctx.region.put(&get(RATES), &prior).await.unwrap();

        let served = execute(Strategy::NetworkFirst, &ctx, &get(RATES)).await.unwrap();
        assert_eq!(served.source, Source::Cache);
        assert_eq!(served.snapshot, prior);
    }

    #[tokio::test]
    async fn test_failure_without_cache_propagates() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.fail(RATES);
        let ctx = context(fetcher).await;

        let result = execute(Strategy::NetworkFirst, &ctx, &get(RATES)).await;
        assert!(matches!(result, Err(Error::NoFallbackAvailable(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_cached() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(RATES, 503, "unavailable");
        let ctx = context(fetcher).await;
        let prior = snapshot(RATES, r#"{"rate":1}"#);
        ctx.region.put(&get(RATES), &prior).await.unwrap();

        let served = execute(Strategy::NetworkFirst, &ctx, &get(RATES)).await.unwrap();
        assert_eq!(served.snapshot.status, 503);
        assert!(served.write_back.is_none());
        assert_eq!(ctx.region.get(&get(RATES)).await.unwrap().unwrap(), prior);
    }
}
