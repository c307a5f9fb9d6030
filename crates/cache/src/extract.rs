//! Safe unpacking of gzip'd tar snapshots.
//!
//! Snapshot archives wrap every path in one synthetic root folder
//! (`<owner>-<repo>-<sha>/`), which is stripped. Only regular files are
//! written; directories are created on demand. Any entry that could land
//! outside the destination fails the whole extraction.

use std::{
    io::Read,
    path::{Component, Path, PathBuf},
};

use {bytes::Bytes, flate2::read::GzDecoder, tracing::warn};

use crate::{Error, Result};

/// Unpack `bytes` into `dest` on the blocking pool. Returns the number of
/// files written.
pub async fn extract_snapshot(bytes: Bytes, dest: PathBuf) -> Result<usize> {
    tokio::task::spawn_blocking(move || unpack_snapshot(&bytes[..], &dest))
        .await
        .map_err(|e| Error::extraction(format!("extraction task failed: {e}")))?
}

/// Unpack a gzip'd tar stream into `dest`.
pub fn unpack_snapshot<R: Read>(reader: R, dest: &Path) -> Result<usize> {
    std::fs::create_dir_all(dest)?;
    let canonical_dest = std::fs::canonicalize(dest)?;
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut written = 0;

    for entry in archive.entries().map_err(Error::extraction)? {
        let mut entry = entry.map_err(Error::extraction)?;
        let kind = entry.header().entry_type();
        let raw_path = entry.path().map_err(Error::extraction)?.into_owned();

        // Validate every path, including ones that are skipped below.
        let Some(relative) = strip_root(&raw_path)? else {
            continue;
        };

        if kind.is_symlink() || kind.is_hard_link() {
            warn!(entry = %raw_path.display(), "skipping link entry in snapshot");
            continue;
        }
        if !kind.is_file() {
            continue;
        }

        let target = canonical_dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
            let canonical_parent = std::fs::canonicalize(parent)?;
            if !canonical_parent.starts_with(&canonical_dest) {
                return Err(Error::PathTraversal {
                    entry: raw_path.display().to_string(),
                });
            }
        }

        if let Ok(meta) = std::fs::symlink_metadata(&target)
            && meta.file_type().is_symlink()
        {
            return Err(Error::PathTraversal {
                entry: raw_path.display().to_string(),
            });
        }

        entry.unpack(&target).map_err(Error::extraction)?;
        written += 1;
    }

    Ok(written)
}

/// Drop the synthetic root segment. `Ok(None)` for the root itself and for
/// top-level metadata entries such as `pax_global_header`.
fn strip_root(path: &Path) -> Result<Option<PathBuf>> {
    let traversal = || Error::PathTraversal {
        entry: path.display().to_string(),
    };

    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(_)) => {},
        Some(Component::CurDir) | None => return Ok(None),
        Some(_) => return Err(traversal()),
    }

    let mut stripped = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => stripped.push(part),
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(traversal());
            },
        }
    }

    if stripped.as_os_str().is_empty() {
        return Ok(None);
    }
    Ok(Some(stripped))
}
