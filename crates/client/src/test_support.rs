//! In-process doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use waypost_core::{Error, RegionBackend, RegionDb, RequestIdentity, ResponseSnapshot};

use crate::fetch::Fetch;

pub(crate) fn get(url: &str) -> RequestIdentity {
    RequestIdentity::parse("GET", url).unwrap()
}

pub(crate) fn tile(n: usize) -> RequestIdentity {
    get(&format!("https://maps.gstatic.com/tiles/{n}.png"))
}

pub(crate) fn snapshot(url: &str, body: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(
        url,
        200,
        vec![("content-type".to_string(), "text/plain".to_string())],
        Bytes::from(body.to_string()),
    )
}

#[derive(Clone)]
enum Reply {
    Status(u16, String),
    Fail,
}

/// Fetch double answering from a script, echoing unknown URLs with 200.
pub(crate) struct ScriptedFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Status(status, body.to_string()));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Fail);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.seen.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait::async_trait]
impl Fetch for ScriptedFetcher {
    async fn fetch(&self, request: &RequestIdentity) -> Result<ResponseSnapshot, Error> {
        let url = request.url().to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(url.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NetworkFailure(format!("offline: {url}")));
        }

        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Status(status, body)) => Ok(ResponseSnapshot::new(
                url,
                status,
                vec![("content-type".to_string(), "text/plain".to_string())],
                Bytes::from(body),
            )),
            Some(Reply::Fail) => Err(Error::NetworkFailure(format!("connection reset: {url}"))),
            None => Ok(snapshot(&url, &format!("body of {url}"))),
        }
    }
}

/// Region backend that can be told to fail reads or writes.
pub(crate) struct FlakyBackend {
    inner: RegionDb,
    pub(crate) fail_reads: AtomicBool,
    pub(crate) fail_writes: AtomicBool,
    /// 1-based index of the one put that fails; 0 disables.
    pub(crate) fail_put_number: AtomicUsize,
    puts: AtomicUsize,
}

impl FlakyBackend {
    pub(crate) async fn new() -> Self {
        Self {
            inner: RegionDb::open_in_memory().await.unwrap(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_put_number: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
        }
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), Error> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::RegionIo(format!("{op} refused")))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl RegionBackend for FlakyBackend {
    async fn open_region(&self, region: &str) -> Result<(), Error> {
        Self::check(&self.fail_writes, "open")?;
        self.inner.open_region(region).await
    }

    async fn get(&self, region: &str, identity: &RequestIdentity) -> Result<Option<ResponseSnapshot>, Error> {
        Self::check(&self.fail_reads, "get")?;
        self.inner.get(region, identity).await
    }

    async fn put(&self, region: &str, identity: &RequestIdentity, snapshot: &ResponseSnapshot) -> Result<(), Error> {
        Self::check(&self.fail_writes, "put")?;
        let number = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if number == self.fail_put_number.load(Ordering::SeqCst) {
            return Err(Error::RegionIo(format!("put #{number} refused")));
        }
        self.inner.put(region, identity, snapshot).await
    }

    async fn delete(&self, region: &str, identity: &RequestIdentity) -> Result<bool, Error> {
        Self::check(&self.fail_writes, "delete")?;
        self.inner.delete(region, identity).await
    }

    async fn keys(&self, region: &str) -> Result<Vec<RequestIdentity>, Error> {
        Self::check(&self.fail_reads, "keys")?;
        self.inner.keys(region).await
    }

    async fn count(&self, region: &str) -> Result<u64, Error> {
        Self::check(&self.fail_reads, "count")?;
        self.inner.count(region).await
    }

    async fn region_names(&self) -> Result<Vec<String>, Error> {
        Self::check(&self.fail_reads, "region_names")?;
        self.inner.region_names().await
    }

    async fn delete_region(&self, region: &str) -> Result<bool, Error> {
        Self::check(&self.fail_writes, "delete_region")?;
        self.inner.delete_region(region).await
    }
}
