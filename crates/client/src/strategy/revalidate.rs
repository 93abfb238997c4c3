//! Stale-while-revalidate.

use tokio::sync::oneshot;
use waypost_core::{Error, RequestIdentity};

use super::{Served, Source, StrategyContext, lookup, no_fallback, persist};

/// Serve the cached copy immediately while refreshing it from the network.
///
/// The network leg always starts and runs detached. With a cached copy the
/// caller never waits for it and its failure is absorbed; without one the
/// caller waits for the in-flight result.
pub async fn stale_while_revalidate(ctx: &StrategyContext, request: &RequestIdentity) -> Result<Served, Error> {
    let cached = lookup(&ctx.region, request).await;

    let (tx, rx) = oneshot::channel();
    let fetcher = ctx.fetcher.clone();
    let region = ctx.region.clone();
    let identity = request.clone();
    let revalidation = ctx.writes.spawn(async move {
        let result = fetcher.fetch(&identity).await;
        let fresh = match &result {
            Ok(response) if response.is_ok() => Some(response.clone()),
            Ok(response) => {
                tracing::debug!(status = response.status, "not storing {identity}");
                None
            }
            Err(e) => {
                tracing::debug!("revalidation of {identity} failed: {e}");
                None
            }
        };
        // the receiver is gone when a cached copy was served
        let _ = tx.send(result);
        if let Some(fresh) = fresh {
            persist(&region, &identity, &fresh, None).await;
        }
    });

    if let Some(hit) = cached {
        tracing::debug!(region = ctx.region.name(), "serving stale {request} while revalidating");
        return Ok(Served::new(hit, Source::Cache, Some(revalidation)));
    }

    match rx.await {
        Ok(Ok(response)) => Ok(Served::new(response, Source::Network, Some(revalidation))),
        Ok(Err(err)) => Err(no_fallback(request, &err)),
        Err(_) => Err(Error::NoFallbackAvailable(format!("{request}: revalidation ended without a result"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::execute;
    use crate::test_support::{ScriptedFetcher, get, snapshot};
    use crate::writeback::WriteBacks;
    use std::sync::Arc;
    use std::time::Duration;
    use waypost_core::{Region, RegionBackend, RegionDb, Strategy};

    const LOADER: &str = "https://maps.googleapis.com/maps/api/js?key=k";

    async fn context(fetcher: Arc<ScriptedFetcher>) -> StrategyContext {
        let backend: Arc<dyn RegionBackend> = Arc::new(RegionDb::open_in_memory().await.unwrap());
        StrategyContext {
            region: Region::open(backend, "app-shell-v4").await.unwrap(),
            fetcher,
            writes: WriteBacks::new(),
            offline_document: None,
        }
    }

    #[tokio::test]
    async fn test_cached_copy_served_when_network_fails() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.fail(LOADER);
        let ctx = context(fetcher.clone()).await;
        let stale = snapshot(LOADER, "loader v1");
        ctx.region.put(&get(LOADER), &stale).await.unwrap();

        let served = execute(Strategy::StaleWhileRevalidate, &ctx, &get(LOADER)).await.unwrap();
        assert_eq!(served.source, Source::Cache);
        assert_eq!(served.snapshot, stale);

        served.write_back.unwrap().done().await;
        assert_eq!(fetcher.calls_for(LOADER), 1);
        assert_eq!(ctx.region.get(&get(LOADER)).await.unwrap().unwrap(), stale);
    }

    #[tokio::test]
    async fn test_miss_returns_network_and_stores() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(LOADER, 200, "loader v2");
        let ctx = context(fetcher).await;

        let served = execute(Strategy::StaleWhileRevalidate, &ctx, &get(LOADER)).await.unwrap();
        assert_eq!(served.source, Source::Network);
        assert_eq!(served.snapshot.body.as_ref(), b"loader v2");

        served.write_back.unwrap().done().await;
        let stored = ctx.region.get(&get(LOADER)).await.unwrap().unwrap();
        assert_eq!(stored.body.as_ref(), b"loader v2");
    }

    #[tokio::test]
    async fn test_stale_copy_refreshed_in_background() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(LOADER, 200, "loader v2");
        fetcher.set_delay(Duration::from_millis(50));
        let ctx = context(fetcher).await;
        ctx.region.put(&get(LOADER), &snapshot(LOADER, "loader v1")).await.unwrap();

        let served = execute(Strategy::StaleWhileRevalidate, &ctx, &get(LOADER)).await.unwrap();
        assert_eq!(served.snapshot.body.as_ref(), b"loader v1");
        let revalidation = served.write_back.unwrap();
        assert!(!revalidation.is_finished());

        revalidation.done().await;
        let refreshed = ctx.region.get(&get(LOADER)).await.unwrap().unwrap();
        assert_eq!(refreshed.body.as_ref(), b"loader v2");
    }

    #[tokio::test]
    async fn test_miss_and_failure_propagates() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.fail(LOADER);
        let ctx = context(fetcher).await;

        let result = execute(Strategy::StaleWhileRevalidate, &ctx, &get(LOADER)).await;
        assert!(matches!(result, Err(Error::NoFallbackAvailable(_))));
    }

    #[tokio::test]
    async fn test_error_status_not_stored() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(LOADER, 500, "boom");
        let ctx = context(fetcher).await;

        let served = execute(Strategy::StaleWhileRevalidate, &ctx, &get(LOADER)).await.unwrap();
        assert_eq!(served.snapshot.status, 500);
        served.write_back.unwrap().done().await;
        assert!(ctx.region.get(&get(LOADER)).await.unwrap().is_none());
    }
}
