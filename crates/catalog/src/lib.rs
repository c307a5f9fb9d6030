//! Remote plugin catalog: repository listing, head-revision resolution and
//! snapshot download against a GitHub-compatible API.
//!
//! Every request goes through a single rate-limit policy: one retry after the
//! host-requested backoff for a primary quota signal, none for the
//! abuse-detection tier.

pub mod catalog;
pub mod error;
pub mod github;
pub mod rate_limit;
pub mod remote;

pub use {
    catalog::list_catalog,
    error::{Error, Result},
    github::GitHubCatalog,
    remote::{OwnerKind, RemoteCatalog},
};
