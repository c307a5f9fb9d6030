use {
    async_trait::async_trait,
    bytes::Bytes,
    hatch_common::{CatalogQuery, PluginRef, Revision},
};

use crate::Result;

/// How the owner of a [`CatalogQuery`] is interpreted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    Organization,
    User,
}

/// The three read operations the plugin flow needs from a source host.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// List repositories of `query.owner` that follow the naming convention.
    async fn list_plugins(&self, query: &CatalogQuery, kind: OwnerKind) -> Result<Vec<PluginRef>>;

    /// Tip commit of the plugin's default branch. Not cached: two calls may
    /// disagree if the remote moved in between.
    async fn resolve_head(&self, plugin: &PluginRef) -> Result<Revision>;

    /// Gzip-compressed tar snapshot of the repository at `revision`.
    async fn download_archive(&self, plugin: &PluginRef, revision: &Revision) -> Result<Bytes>;
}
