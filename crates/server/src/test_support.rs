//! Doubles shared by the tool tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use waypost_client::{Fetch, Interceptor};
use waypost_core::{AppConfig, Error, RegionBackend, RegionDb, RequestIdentity, ResponseSnapshot};

pub(crate) fn get(url: &str) -> RequestIdentity {
    RequestIdentity::parse("GET", url).unwrap()
}

pub(crate) fn config() -> Arc<AppConfig> {
    Arc::new(AppConfig { app_origin: "https://trip.example".into(), ..Default::default() })
}

/// Interceptor over an in-memory store with the test configuration.
pub(crate) async fn interceptor(fetcher: Arc<StubFetcher>) -> (Interceptor, Arc<AppConfig>) {
    let config = config();
    let backend: Arc<dyn RegionBackend> = Arc::new(RegionDb::open_in_memory().await.unwrap());
    (Interceptor::new(&config, backend, fetcher).unwrap(), config)
}

/// Fetch double: scripted URLs answer, everything else is a network failure.
#[derive(Default)]
pub(crate) struct StubFetcher {
    replies: Mutex<HashMap<String, (u16, String)>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), (status, body.to_string()));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetch for StubFetcher {
    async fn fetch(&self, request: &RequestIdentity) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url().to_string();
        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some((status, body)) => Ok(ResponseSnapshot::new(url, status, Vec::new(), bytes::Bytes::from(body))),
            None => Err(Error::NetworkFailure(format!("no route to {url}"))),
        }
    }
}
