//! Cache root selection and per-plugin entry lifecycle.

use std::{
    io,
    path::{Path, PathBuf},
};

use {
    hatch_common::Revision,
    serde::Serialize,
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    error::Context,
};

/// File name prefix of the freshness marker; the revision follows it.
pub const MARKER_PREFIX: &str = ".hatch-rev-";

const WRITE_CHECK: &str = ".hatch-write-check";

/// Freshness of one plugin's cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// No directory exists for the plugin.
    Absent,
    /// Reusable as-is. Carries the revision recorded by the marker, which is
    /// `None` only when update checks are skipped and the marker is unusable.
    Fresh(Option<Revision>),
    /// Directory exists but the marker is missing, duplicated or names a
    /// different revision.
    Stale,
}

/// One populated plugin directory under the cache root.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub plugin_name: String,
    pub local_path: PathBuf,
    pub freshness_marker: Option<Revision>,
}

/// Sole owner of the cache directories: nothing else deletes or rewrites them.
#[derive(Debug)]
pub struct CacheManager {
    root: PathBuf,
    skip_update: bool,
}

impl CacheManager {
    /// Open the cache at `preferred` (or the platform cache directory).
    ///
    /// If that root is not writable the per-user root under the home
    /// directory is used instead. The choice is made once, here.
    pub fn open(preferred: Option<PathBuf>, skip_update: bool) -> Result<Self> {
        let preferred = match preferred {
            Some(path) => path,
            None => default_root()?,
        };
        let root = choose_root(preferred, fallback_root()?, check_writable)?;
        info!(root = %root.display(), skip_update, "opened plugin cache");
        Ok(Self { root, skip_update })
    }

    /// Use `root` as-is, without the writability check.
    pub fn with_root(root: impl Into<PathBuf>, skip_update: bool) -> Self {
        Self {
            root: root.into(),
            skip_update,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn skip_update(&self) -> bool {
        self.skip_update
    }

    /// Directory for `plugin_name`. Names that could leave the cache root are
    /// rejected.
    pub fn entry_path(&self, plugin_name: &str) -> Result<PathBuf> {
        let valid = !plugin_name.is_empty()
            && !plugin_name.starts_with('.')
            && !plugin_name.contains(['/', '\\'])
            && !plugin_name.contains('\0');
        if !valid {
            return Err(Error::InvalidPluginName {
                name: plugin_name.to_string(),
            });
        }
        Ok(self.root.join(plugin_name))
    }

    /// Classify the entry for `plugin_name` against the `expected` revision.
    ///
    /// With update checks skipped any existing directory is fresh. Otherwise
    /// an entry is fresh only when it holds exactly one marker and that
    /// marker names `expected`.
    pub fn status(&self, plugin_name: &str, expected: Option<&Revision>) -> Result<CacheStatus> {
        let dir = self.entry_path(plugin_name)?;
        if !dir.exists() {
            return Ok(CacheStatus::Absent);
        }

        let markers = read_markers(&dir)?;
        let recorded = match markers.as_slice() {
            [only] => Revision::parse(only.as_str()).ok(),
            _ => None,
        };

        if self.skip_update {
            return Ok(CacheStatus::Fresh(recorded));
        }

        let status = match (recorded, expected) {
            (Some(recorded), Some(expected)) if &recorded == expected => {
                CacheStatus::Fresh(Some(recorded))
            },
            _ => CacheStatus::Stale,
        };
        debug!(plugin = plugin_name, ?status, markers = markers.len(), "cache status");
        Ok(status)
    }

    /// Remove the whole entry directory. Succeeds when nothing is left;
    /// fails loudly otherwise.
    pub async fn evict(&self, plugin_name: &str) -> Result<()> {
        let dir = self.entry_path(plugin_name)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => return Err(Error::Eviction { path: dir, source }),
        }
        if dir.exists() {
            return Err(Error::Eviction {
                path: dir,
                source: io::Error::other("directory still present after removal"),
            });
        }
        info!(plugin = plugin_name, "evicted cache entry");
        Ok(())
    }

    /// Record `revision` as the content of the populated entry. Must be the
    /// last write into the entry.
    pub async fn mark_fresh(&self, plugin_name: &str, revision: &Revision) -> Result<()> {
        let dir = self.entry_path(plugin_name)?;
        for stale in read_markers(&dir)? {
            if stale != revision.as_str() {
                tokio::fs::remove_file(dir.join(format!("{MARKER_PREFIX}{stale}"))).await?;
            }
        }

        let marker = dir.join(format!("{MARKER_PREFIX}{revision}"));
        let file = tokio::fs::File::create(&marker).await?;
        file.sync_all().await?;
        debug!(plugin = plugin_name, revision = %revision.short(), "marked fresh");
        Ok(())
    }

    /// All plugin directories under the root, sorted by name.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        let listing = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to list cache root {}", self.root.display()))?;
        for item in listing.flatten() {
            let path = item.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
                continue;
            };
            if name.starts_with('.') || !path.is_dir() {
                continue;
            }
            let markers = read_markers(&path)?;
            let freshness_marker = match markers.as_slice() {
                [only] => Revision::parse(only.as_str()).ok(),
                _ => None,
            };
            entries.push(CacheEntry {
                plugin_name: name,
                local_path: path,
                freshness_marker,
            });
        }
        entries.sort_by(|a, b| a.plugin_name.cmp(&b.plugin_name));
        Ok(entries)
    }
}

/// Revisions named by marker files directly inside `dir`.
fn read_markers(dir: &Path) -> Result<Vec<String>> {
    let listing = match std::fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(listing
        .flatten()
        .filter(|item| item.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|item| {
            item.file_name()
                .to_str()
                .and_then(|n| n.strip_prefix(MARKER_PREFIX))
                .map(str::to_owned)
        })
        .collect())
}

fn default_root() -> Result<PathBuf> {
    match directories::ProjectDirs::from("", "", "hatch") {
        Some(dirs) => Ok(dirs.cache_dir().join("plugins")),
        None => fallback_root(),
    }
}

/// Per-user root: `~/.hatch/plugins`.
fn fallback_root() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".hatch").join("plugins"))
        .ok_or_else(|| Error::message("cannot determine the home directory"))
}

fn check_writable(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let scratch = dir.join(WRITE_CHECK);
    std::fs::write(&scratch, b"")?;
    std::fs::remove_file(&scratch)
}

fn is_permission_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem
    )
}

/// Pick the cache root: `preferred` when writable, else `fallback`.
fn choose_root(
    preferred: PathBuf,
    fallback: PathBuf,
    writable: impl Fn(&Path) -> io::Result<()>,
) -> Result<PathBuf> {
    match writable(&preferred) {
        Ok(()) => Ok(preferred),
        Err(e) if is_permission_error(&e) => {
            warn!(
                denied = %preferred.display(),
                fallback = %fallback.display(),
                "cache root not writable, using per-user root"
            );
            match writable(&fallback) {
                Ok(()) => Ok(fallback),
                Err(source) => Err(Error::PermissionDenied {
                    path: fallback,
                    source,
                }),
            }
        },
        Err(e) => Err(e.into()),
    }
}
