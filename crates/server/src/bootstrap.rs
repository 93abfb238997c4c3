//! Startup sequence: install the shell region, then activate.
//!
//! Install is all-or-nothing per attempt. A failed attempt leaves the
//! instance `Redundant`; the host retries with a fixed backoff until the
//! configured attempt budget is spent.

use std::time::Duration;

use waypost_client::{ActivationReport, InstallReport, Lifecycle};
use waypost_core::Error;

/// Pause between install attempts.
pub const INSTALL_BACKOFF: Duration = Duration::from_secs(2);

/// Run install up to `attempts` times, sleeping `backoff` between failures.
pub async fn install_with_retry(
    lifecycle: &Lifecycle, attempts: u32, backoff: Duration,
) -> Result<InstallReport, Error> {
    let mut attempt = 1;
    loop {
        match lifecycle.install().await {
            Ok(report) => {
                tracing::info!(region = %report.region, cached = report.cached.len(), attempt, "install complete");
                return Ok(report);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, attempts, "install attempt failed, retrying: {e}");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Install (with retries) and activate.
pub async fn start(lifecycle: &Lifecycle, attempts: u32, backoff: Duration) -> Result<ActivationReport, Error> {
    install_with_retry(lifecycle, attempts, backoff).await?;
    let report = lifecycle.activate().await?;
    tracing::info!(
        deleted = ?report.deleted_regions,
        claimed = report.claimed_clients,
        controller = lifecycle.controller_id(),
        "interception layer ready"
    );
    Ok(report)
}
