//! Storage seam for cache regions.

use std::fmt;
use std::sync::Arc;

use crate::{Error, RequestIdentity, ResponseSnapshot};

/// Operations over a set of independently named regions.
///
/// Implementations serialize per key at most; callers must not assume any
/// cross-operation atomicity.
#[async_trait::async_trait]
pub trait RegionBackend: Send + Sync {
    /// Create the region if it does not exist yet.
    async fn open_region(&self, region: &str) -> Result<(), Error>;

    /// Look up the stored snapshot for an identity.
    async fn get(&self, region: &str, identity: &RequestIdentity) -> Result<Option<ResponseSnapshot>, Error>;

    /// Store a snapshot, creating the region if needed.
    ///
    /// Overwriting an identity makes it the newest insertion.
    async fn put(&self, region: &str, identity: &RequestIdentity, snapshot: &ResponseSnapshot) -> Result<(), Error>;

    /// Delete one entry. Returns whether anything was removed.
    async fn delete(&self, region: &str, identity: &RequestIdentity) -> Result<bool, Error>;

    /// Identities in insertion order, oldest first.
    async fn keys(&self, region: &str) -> Result<Vec<RequestIdentity>, Error>;

    /// Number of entries in the region (0 if it does not exist).
    async fn count(&self, region: &str) -> Result<u64, Error>;

    /// Names of every persisted region.
    async fn region_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a region and all of its entries. Returns whether it existed.
    async fn delete_region(&self, region: &str) -> Result<bool, Error>;
}

/// Handle to one named region.
#[derive(Clone)]
pub struct Region {
    backend: Arc<dyn RegionBackend>,
    name: Arc<str>,
}

impl Region {
    /// Bind a handle without touching storage.
    pub fn new(backend: Arc<dyn RegionBackend>, name: impl Into<Arc<str>>) -> Self {
        Self { backend, name: name.into() }
    }

    /// Bind a handle and create the region if it does not exist.
    pub async fn open(backend: Arc<dyn RegionBackend>, name: impl Into<Arc<str>>) -> Result<Self, Error> {
        let region = Self::new(backend, name);
        region.backend.open_region(&region.name).await?;
        Ok(region)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, identity: &RequestIdentity) -> Result<Option<ResponseSnapshot>, Error> {
        self.backend.get(&self.name, identity).await
    }

    pub async fn put(&self, identity: &RequestIdentity, snapshot: &ResponseSnapshot) -> Result<(), Error> {
        self.backend.put(&self.name, identity, snapshot).await
    }

    pub async fn delete(&self, identity: &RequestIdentity) -> Result<bool, Error> {
        self.backend.delete(&self.name, identity).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestIdentity>, Error> {
        self.backend.keys(&self.name).await
    }

    pub async fn count(&self) -> Result<u64, Error> {
        self.backend.count(&self.name).await
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region").field("name", &self.name).finish_non_exhaustive()
    }
}
