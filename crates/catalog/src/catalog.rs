//! Catalog assembly: the primary query plus an optional additional source.

use {
    hatch_common::{CatalogQuery, PluginRef},
    tracing::{info, warn},
};

use crate::{
    Result,
    remote::{OwnerKind, RemoteCatalog},
};

/// List plugins from `primary`, then merge in `additional` when configured.
///
/// The primary owner is always queried as an organization. The additional
/// owner is tried as an organization first and, on any failure other than a
/// rate limit, once more as an individual account. When both sources expose
/// the same plugin name the primary entry wins.
pub async fn list_catalog(
    remote: &dyn RemoteCatalog,
    primary: &CatalogQuery,
    additional: Option<&CatalogQuery>,
) -> Result<Vec<PluginRef>> {
    let mut plugins = remote.list_plugins(primary, OwnerKind::Organization).await?;

    if let Some(extra) = additional {
        let extra_plugins = match remote.list_plugins(extra, OwnerKind::Organization).await {
            Ok(found) => found,
            Err(e) if e.is_rate_limited() => return Err(e),
            Err(e) => {
                info!(owner = %extra.owner, error = %e, "not an organization, retrying as user");
                remote.list_plugins(extra, OwnerKind::User).await?
            },
        };

        for plugin in extra_plugins {
            if plugins.iter().any(|p| p.plugin_name == plugin.plugin_name) {
                warn!(
                    plugin = %plugin.plugin_name,
                    ignored = %plugin.slug(),
                    "duplicate plugin name in additional catalog"
                );
                continue;
            }
            plugins.push(plugin);
        }
    }

    Ok(plugins)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::Error,
        async_trait::async_trait,
        bytes::Bytes,
        hatch_common::Revision,
        std::{sync::Mutex, time::Duration},
    };

    /// Serves fixed repository names per (owner, kind); records calls.
    #[derive(Default)]
    struct FakeRemote {
        repos: Vec<(&'static str, OwnerKind, Vec<&'static str>)>,
        rate_limited_owner: Option<&'static str>,
        calls: Mutex<Vec<(String, OwnerKind)>>,
    }

    #[async_trait]
    impl RemoteCatalog for FakeRemote {
        async fn list_plugins(
            &self,
            query: &CatalogQuery,
            kind: OwnerKind,
        ) -> Result<Vec<PluginRef>> {
            self.calls.lock().unwrap().push((query.owner.clone(), kind));
            if self.rate_limited_owner == Some(query.owner.as_str()) {
                return Err(Error::RateLimited {
                    retry_after: Duration::from_secs(1),
                    secondary: true,
                });
            }
            self.repos
                .iter()
                .find(|(owner, k, _)| *owner == query.owner && *k == kind)
                .map(|(_, _, names)| {
                    names
                        .iter()
                        .filter_map(|name| PluginRef::from_repository(query, name, "main"))
                        .collect()
                })
                .ok_or_else(|| Error::remote_unavailable(&query.owner, "HTTP 404"))
        }

        async fn resolve_head(&self, _plugin: &PluginRef) -> Result<Revision> {
            unreachable!()
        }

        async fn download_archive(&self, _plugin: &PluginRef, _rev: &Revision) -> Result<Bytes> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn primary_only() {
        let remote = FakeRemote {
            repos: vec![(
                "ui5",
                OwnerKind::Organization,
                vec!["generator-ui5-foo", "generator-ui5-bar", "other-repo"],
            )],
            ..Default::default()
        };
        let primary = CatalogQuery::new("ui5", "generator-ui5-");
        let plugins = list_catalog(&remote, &primary, None).await.unwrap();
        let names: Vec<_> = plugins.iter().map(|p| p.plugin_name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar"]);
    }

    #[tokio::test]
    async fn additional_source_falls_back_to_user() {
        let remote = FakeRemote {
            repos: vec![
                ("ui5", OwnerKind::Organization, vec!["generator-ui5-app"]),
                ("alice", OwnerKind::User, vec!["gen-tool", "gen-app"]),
            ],
            ..Default::default()
        };
        let primary = CatalogQuery::new("ui5", "generator-ui5-");
        let extra = CatalogQuery::new("alice", "gen-");
        let plugins = list_catalog(&remote, &primary, Some(&extra)).await.unwrap();

        let names: Vec<_> = plugins.iter().map(|p| p.slug()).collect();
        assert_eq!(names, vec!["ui5/generator-ui5-app", "alice/gen-tool"]);

        let calls = remote.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![
            ("ui5".to_string(), OwnerKind::Organization),
            ("alice".to_string(), OwnerKind::Organization),
            ("alice".to_string(), OwnerKind::User),
        ]);
    }

    #[tokio::test]
    async fn primary_failure_is_not_retried_as_user() {
        let remote = FakeRemote {
            repos: vec![("ui5", OwnerKind::User, vec!["generator-ui5-app"])],
            ..Default::default()
        };
        let primary = CatalogQuery::new("ui5", "generator-ui5-");
        let err = list_catalog(&remote, &primary, None).await.unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable { .. }));
        assert_eq!(remote.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn additional_failure_as_both_kinds_surfaces() {
        let remote = FakeRemote {
            repos: vec![("ui5", OwnerKind::Organization, vec!["generator-ui5-app"])],
            ..Default::default()
        };
        let primary = CatalogQuery::new("ui5", "generator-ui5-");
        let extra = CatalogQuery::new("nobody", "gen-");
        let err = list_catalog(&remote, &primary, Some(&extra)).await.unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn rate_limit_skips_user_fallback() {
        let remote = FakeRemote {
            repos: vec![("ui5", OwnerKind::Organization, vec!["generator-ui5-app"])],
            rate_limited_owner: Some("alice"),
            ..Default::default()
        };
        let primary = CatalogQuery::new("ui5", "generator-ui5-");
        let extra = CatalogQuery::new("alice", "gen-");
        let err = list_catalog(&remote, &primary, Some(&extra)).await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(remote.calls.lock().unwrap().len(), 2);
    }
}
