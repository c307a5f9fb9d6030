//! Make a plugin's cache entry current: check → evict → fetch → mark.

use std::path::PathBuf;

use {
    hatch_catalog::RemoteCatalog,
    hatch_common::{PluginRef, Revision},
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    fetch::fetch_and_extract,
    manager::{CacheManager, CacheStatus},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Re-download even when the entry is fresh.
    pub force_update: bool,
    /// Never touch the network; an absent entry is an error.
    pub offline: bool,
}

/// Outcome of [`provision`].
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub path: PathBuf,
    /// Revision the entry reflects, when known.
    pub revision: Option<Revision>,
    /// Whether a snapshot was downloaded during this call.
    pub fetched: bool,
}

/// Ensure `plugin` is present in the cache at the remote head revision.
///
/// When update checks are skipped (or offline) an existing entry is used
/// without any network access. Otherwise the head revision is resolved; a
/// fresh entry is reused untouched, and anything else is evicted in full and
/// fetched again.
pub async fn provision(
    remote: &dyn RemoteCatalog,
    cache: &CacheManager,
    plugin: &PluginRef,
    options: ProvisionOptions,
) -> Result<Provisioned> {
    let name = plugin.plugin_name.as_str();

    if !options.force_update && (options.offline || cache.skip_update()) {
        if let CacheStatus::Fresh(revision) = cache.status(name, None)? {
            debug!(plugin = name, "using cached plugin without update check");
            return Ok(Provisioned {
                path: cache.entry_path(name)?,
                revision,
                fetched: false,
            });
        }
        if options.offline {
            return Err(Error::NotCached {
                plugin: name.to_string(),
            });
        }
    }

    let revision = remote.resolve_head(plugin).await?;

    match cache.status(name, Some(&revision))? {
        CacheStatus::Fresh(_) if !options.force_update => {
            debug!(plugin = name, revision = %revision.short(), "cache entry is fresh");
            return Ok(Provisioned {
                path: cache.entry_path(name)?,
                revision: Some(revision),
                fetched: false,
            });
        },
        CacheStatus::Absent => {},
        status => {
            info!(plugin = name, ?status, revision = %revision.short(), "refreshing cache entry");
            cache.evict(name).await?;
        },
    }

    let path = fetch_and_extract(remote, cache, plugin, &revision).await?;
    Ok(Provisioned {
        path,
        revision: Some(revision),
        fetched: true,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            manager::MARKER_PREFIX,
            test_support::{SnapshotEntry, plugin_snapshot, snapshot},
        },
        async_trait::async_trait,
        bytes::Bytes,
        hatch_catalog::OwnerKind,
        hatch_common::CatalogQuery,
        std::sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    const REV_1: &str = "1111111111111111111111111111111111111111";
    const REV_2: &str = "2222222222222222222222222222222222222222";

    /// Remote whose head can be moved; each revision's snapshot carries the
    /// revision id in `VERSION`.
    struct FakeRemote {
        head: Mutex<Revision>,
        archive: Mutex<Option<Vec<u8>>>,
        resolves: AtomicUsize,
        downloads: AtomicUsize,
    }

    impl FakeRemote {
        fn at(rev: &str) -> Self {
            Self {
                head: Mutex::new(Revision::parse(rev).unwrap()),
                archive: Mutex::new(None),
                resolves: AtomicUsize::new(0),
                downloads: AtomicUsize::new(0),
            }
        }

        fn move_head(&self, rev: &str) {
            *self.head.lock().unwrap() = Revision::parse(rev).unwrap();
        }

        fn serve_archive(&self, bytes: Vec<u8>) {
            *self.archive.lock().unwrap() = Some(bytes);
        }
    }

    #[async_trait]
    impl RemoteCatalog for FakeRemote {
        async fn list_plugins(
            &self,
            _query: &CatalogQuery,
            _kind: OwnerKind,
        ) -> hatch_catalog::Result<Vec<PluginRef>> {
            Ok(vec![plugin()])
        }

        async fn resolve_head(&self, _plugin: &PluginRef) -> hatch_catalog::Result<Revision> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            Ok(self.head.lock().unwrap().clone())
        }

        async fn download_archive(
            &self,
            _plugin: &PluginRef,
            rev: &Revision,
        ) -> hatch_catalog::Result<Bytes> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let bytes = self
                .archive
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| plugin_snapshot(rev.as_str()));
            Ok(Bytes::from(bytes))
        }
    }

    fn plugin() -> PluginRef {
        PluginRef {
            owner: "acme".into(),
            repository_name: "generator-ui5-app".into(),
            default_branch: "main".into(),
            plugin_name: "app".into(),
        }
    }

    fn markers(dir: &std::path::Path) -> Vec<String> {
        let mut found: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(str::to_owned))
            .filter(|n| n.starts_with(MARKER_PREFIX))
            .collect();
        found.sort();
        found
    }

    #[tokio::test]
    async fn absent_entry_is_fetched_and_marked() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_root(tmp.path(), false);
        let remote = FakeRemote::at(REV_1);

        let out = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();

        assert!(out.fetched);
        assert_eq!(out.revision.as_ref().map(Revision::as_str), Some(REV_1));
        assert_eq!(std::fs::read_to_string(out.path.join("VERSION")).unwrap(), REV_1);
        assert_eq!(markers(&out.path), vec![format!("{MARKER_PREFIX}{REV_1}")]);
    }

    #[tokio::test]
    async fn fresh_entry_is_reused_without_download_or_eviction() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_root(tmp.path(), false);
        let remote = FakeRemote::at(REV_1);

        let first = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();
        // Anything evicted would take this file with it.
        std::fs::write(first.path.join("node_modules.stamp"), "").unwrap();

        let second = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();

        assert!(!second.fetched);
        assert_eq!(remote.downloads.load(Ordering::SeqCst), 1);
        assert!(second.path.join("node_modules.stamp").exists());
    }

    #[tokio::test]
    async fn moved_head_evicts_and_refetches() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_root(tmp.path(), false);
        let remote = FakeRemote::at(REV_1);

        let first = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();
        std::fs::write(first.path.join("leftover.txt"), "old").unwrap();

        remote.move_head(REV_2);
        let second = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();

        assert!(second.fetched);
        assert_eq!(remote.downloads.load(Ordering::SeqCst), 2);
        assert!(!second.path.join("leftover.txt").exists());
        assert_eq!(std::fs::read_to_string(second.path.join("VERSION")).unwrap(), REV_2);
        assert_eq!(markers(&second.path), vec![format!("{MARKER_PREFIX}{REV_2}")]);
    }

    #[tokio::test]
    async fn entry_without_marker_is_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_root(tmp.path(), false);
        let partial = tmp.path().join("app");
        std::fs::create_dir_all(&partial).unwrap();
        std::fs::write(partial.join("half-written.js"), "").unwrap();
        let remote = FakeRemote::at(REV_1);

        let out = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();

        assert!(out.fetched);
        assert!(!out.path.join("half-written.js").exists());
        assert_eq!(markers(&out.path), vec![format!("{MARKER_PREFIX}{REV_1}")]);
    }

    #[tokio::test]
    async fn skip_update_uses_existing_entry_without_network() {
        let tmp = tempfile::tempdir().unwrap();
        let partial = tmp.path().join("app");
        std::fs::create_dir_all(&partial).unwrap();
        let cache = CacheManager::with_root(tmp.path(), true);
        let remote = FakeRemote::at(REV_1);

        let out = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();

        assert!(!out.fetched);
        assert_eq!(out.revision, None);
        assert_eq!(remote.resolves.load(Ordering::SeqCst), 0);
        assert_eq!(remote.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn skip_update_still_fetches_absent_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_root(tmp.path(), true);
        let remote = FakeRemote::at(REV_1);

        let out = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();
        assert!(out.fetched);
    }

    #[tokio::test]
    async fn offline_without_entry_is_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_root(tmp.path(), true);
        let remote = FakeRemote::at(REV_1);

        let options = ProvisionOptions {
            offline: true,
            ..Default::default()
        };
        let err = provision(&remote, &cache, &plugin(), options).await.unwrap_err();

        assert!(matches!(err, Error::NotCached { .. }));
        assert_eq!(remote.resolves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn force_update_refetches_fresh_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_root(tmp.path(), false);
        let remote = FakeRemote::at(REV_1);
        provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap();

        let options = ProvisionOptions {
            force_update: true,
            ..Default::default()
        };
        let out = provision(&remote, &cache, &plugin(), options).await.unwrap();

        assert!(out.fetched);
        assert_eq!(remote.downloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn traversal_archive_fails_and_leaves_no_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("cache");
        let cache = CacheManager::with_root(&root, false);
        let remote = FakeRemote::at(REV_1);
        remote.serve_archive(snapshot(&[
            SnapshotEntry::file("root/package.json", "{}"),
            SnapshotEntry::file("root/../../../outside.txt", "pwned"),
        ]));

        let err = provision(&remote, &cache, &plugin(), ProvisionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PathTraversal { .. }));
        assert!(!tmp.path().join("outside.txt").exists());
        assert_eq!(cache.status("app", None).unwrap(), CacheStatus::Absent);
    }
}
