//! Install and activation of the interception layer.
//!
//! ### Install
//! - Resolve the manifest against the application origin.
//! - Fetch every entry concurrently; all must succeed with an ok status.
//! - Only then write them into the shell region, in manifest order.
//! - Skip waiting: the new instance is immediately eligible to activate.
//!
//! ### Activate
//! - Delete every persisted region outside the configured region set.
//! - Claim all open clients without a reload.
//!
//! Phases are published on a watch channel so the host can observe them.

pub mod clients;

pub use clients::ClientRegistry;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use url::Url;
use waypost_core::{AppConfig, Error, Region, RegionBackend, RequestIdentity, ResponseSnapshot};

use crate::fetch::{Fetch, resolve_manifest_path};

/// Lifecycle phase of this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; a new install attempt may be made.
    Redundant,
}

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub region: String,
    pub cached: Vec<String>,
    /// Always true: a fresh install takes over without waiting for old instances.
    pub skip_waiting: bool,
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub deleted_regions: Vec<String>,
    pub claimed_clients: usize,
}

/// Drives install and activation for one configuration.
pub struct Lifecycle {
    config: Arc<AppConfig>,
    origin: Url,
    backend: Arc<dyn RegionBackend>,
    fetcher: Arc<dyn Fetch>,
    clients: ClientRegistry,
    phase: watch::Sender<Phase>,
}

impl Lifecycle {
    /// Create a lifecycle manager in the `Parsed` phase.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the application origin does not parse.
    pub fn new(
        config: Arc<AppConfig>, backend: Arc<dyn RegionBackend>, fetcher: Arc<dyn Fetch>, clients: ClientRegistry,
    ) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let (phase, _) = watch::channel(Phase::Parsed);
        Ok(Self { config, origin, backend, fetcher, clients, phase })
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Observe phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Controller identity announced to claimed clients: the versioned shell region name.
    pub fn controller_id(&self) -> &str {
        &self.config.regions.shell
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.send_replace(phase);
        tracing::info!(?phase, "lifecycle phase changed");
    }

    /// Pre-populate the shell region from the manifest.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any manifest entry cannot be fetched,
    /// answers with a non-ok status, or cannot be stored. Nothing from this
    /// attempt is left in the region. Returns `Error::Lifecycle` if the
    /// instance is already installed or active.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        match self.phase() {
            Phase::Parsed | Phase::Redundant => {}
            other => return Err(Error::Lifecycle(format!("cannot install while {other:?}"))),
        }

        self.set_phase(Phase::Installing);
        match self.populate_shell().await {
            Ok(report) => {
                self.set_phase(Phase::Installed);
                Ok(report)
            }
            Err(e) => {
                tracing::error!("install failed: {e}");
                self.set_phase(Phase::Redundant);
                Err(e)
            }
        }
    }

    async fn populate_shell(&self) -> Result<InstallReport, Error> {
        let identities = self
            .config
            .manifest
            .iter()
            .map(|path| {
                resolve_manifest_path(&self.origin, path)
                    .map(RequestIdentity::get)
                    .map_err(|e| Error::InstallFailed(format!("manifest entry {path}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fetched = self.fetch_all(&identities).await?;

        let region = Region::open(self.backend.clone(), self.config.regions.shell.clone())
            .await
            .map_err(|e| Error::InstallFailed(format!("opening {}: {e}", self.config.regions.shell)))?;

        let mut previous = Vec::with_capacity(fetched.len());
        for (identity, _) in &fetched {
            let prior = region
                .get(identity)
                .await
                .map_err(|e| Error::InstallFailed(format!("reading {identity}: {e}")))?;
            previous.push(prior);
        }

        for (n, (identity, snapshot)) in fetched.iter().enumerate() {
            if let Err(e) = region.put(identity, snapshot).await {
                restore(&region, &fetched[..n], &previous[..n]).await;
                return Err(Error::InstallFailed(format!("storing {identity}: {e}")));
            }
        }

        tracing::info!(region = region.name(), entries = fetched.len(), "app shell pre-populated");

        Ok(InstallReport {
            region: region.name().to_string(),
            cached: fetched.iter().map(|(id, _)| id.url().to_string()).collect(),
            skip_waiting: true,
        })
    }

    /// Fetch every manifest entry concurrently, preserving manifest order.
    async fn fetch_all(
        &self, identities: &[RequestIdentity],
    ) -> Result<Vec<(RequestIdentity, ResponseSnapshot)>, Error> {
        let mut join_set = JoinSet::new();
        for (index, identity) in identities.iter().cloned().enumerate() {
            let fetcher = self.fetcher.clone();
            join_set.spawn(async move {
                let result = fetcher.fetch(&identity).await;
                (index, identity, result)
            });
        }

        let mut slots: Vec<Option<(RequestIdentity, ResponseSnapshot)>> = identities.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (index, identity, result) =
                joined.map_err(|e| Error::InstallFailed(format!("manifest fetch task failed: {e}")))?;
            match result {
                Ok(snapshot) if snapshot.is_ok() => slots[index] = Some((identity, snapshot)),
                Ok(snapshot) => {
                    return Err(Error::InstallFailed(format!("{identity} answered {}", snapshot.status)));
                }
                Err(e) => return Err(Error::InstallFailed(format!("{identity}: {e}"))),
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Delete stale regions and claim all clients.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lifecycle` unless the instance is installed, or a
    /// region store error if enumeration or deletion fails (the instance
    /// stays installed and activation may be retried).
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        if self.phase() != Phase::Installed {
            return Err(Error::Lifecycle(format!("cannot activate while {:?}", self.phase())));
        }

        self.set_phase(Phase::Activating);
        let deleted_regions = match self.delete_stale_regions().await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.set_phase(Phase::Installed);
                return Err(e);
            }
        };

        let claimed_clients = self.clients.claim(self.controller_id()).await;
        self.set_phase(Phase::Activated);

        tracing::info!(deleted = deleted_regions.len(), claimed_clients, "activated");
        Ok(ActivationReport { deleted_regions, claimed_clients })
    }

    async fn delete_stale_regions(&self) -> Result<Vec<String>, Error> {
        let keep = self.config.region_set();
        let mut deleted = Vec::new();
        for name in self.backend.region_names().await? {
            if keep.contains(&name) {
                continue;
            }
            if self.backend.delete_region(&name).await? {
                tracing::info!(region = %name, "deleted stale region");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}

/// Put back what a failed install overwrote. Identities that were absent
/// before the install are deleted.
async fn restore(
    region: &Region, written: &[(RequestIdentity, ResponseSnapshot)], previous: &[Option<ResponseSnapshot>],
) {
    for ((identity, _), prior) in written.iter().zip(previous) {
        let result = match prior {
            Some(snapshot) => region.put(identity, snapshot).await,
            None => region.delete(identity).await.map(|_| ()),
        };
        if let Err(e) = result {
            tracing::warn!("could not roll back {identity}: {e}");
        }
    }
}
