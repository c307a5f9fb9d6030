//! Download a snapshot and materialize it as a cache entry.

use {
    hatch_catalog::RemoteCatalog,
    hatch_common::{PluginRef, Revision},
    std::path::PathBuf,
    tracing::{info, warn},
};

use crate::{Error, Result, extract::extract_snapshot, manager::CacheManager};

/// Download `plugin` at `revision` and extract it into its (absent) cache
/// entry, then write the freshness marker as the final step.
///
/// A failed extraction removes the partial entry; if that removal also
/// fails, the missing marker still makes the next run see it as stale.
pub async fn fetch_and_extract(
    remote: &dyn RemoteCatalog,
    cache: &CacheManager,
    plugin: &PluginRef,
    revision: &Revision,
) -> Result<PathBuf> {
    let name = plugin.plugin_name.as_str();
    let dest = cache.entry_path(name)?;
    if dest.exists() {
        return Err(Error::EntryNotEvicted { path: dest });
    }

    let bytes = remote.download_archive(plugin, revision).await?;

    let files = match extract_snapshot(bytes, dest.clone()).await {
        Ok(files) => files,
        Err(e) => {
            warn!(plugin = name, error = %e, "extraction failed, discarding partial entry");
            if let Err(evict_err) = cache.evict(name).await {
                warn!(plugin = name, error = %evict_err, "could not discard partial entry");
            }
            return Err(e);
        },
    };

    cache.mark_fresh(name, revision).await?;
    info!(plugin = name, revision = %revision.short(), files, "cached plugin");
    Ok(dest)
}
