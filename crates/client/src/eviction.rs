//! Oldest-insertion-first eviction for size-bounded regions.
//!
//! There is no access-recency tracking: the region's insertion order is the
//! only signal. Concurrent trims only ever delete prefixes of that order, so
//! redundant runs remove nothing extra.

use waypost_core::{Error, Region};

/// Delete the oldest entries until the region holds at most `max_entries`.
///
/// Returns the number of entries this call actually removed; entries already
/// deleted by a concurrent trim are skipped without error.
pub async fn trim_region(region: &Region, max_entries: usize) -> Result<u64, Error> {
    let keys = region.keys().await?;
    if keys.len() <= max_entries {
        return Ok(0);
    }

    let excess = keys.len() - max_entries;
    let mut removed = 0u64;
    for key in &keys[..excess] {
        if region.delete(key).await? {
            removed += 1;
        }
    }

    tracing::debug!(region = region.name(), removed, max_entries, "trimmed region");
    Ok(removed)
}
