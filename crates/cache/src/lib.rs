//! On-disk plugin cache: freshness tracking, eviction, snapshot extraction
//! and the provisioning flow that ties them to the remote catalog.
//!
//! Layout: one directory per plugin under a single cache root. A populated
//! entry holds the extracted snapshot plus exactly one `.hatch-rev-<sha>`
//! marker, written last. An entry without a matching marker is stale and is
//! removed wholesale before it is populated again.

pub mod error;
pub mod extract;
pub mod fetch;
pub mod manager;
pub mod provision;

#[cfg(test)]
pub(crate) mod test_support;

pub use {
    error::{Error, Result},
    manager::{CacheEntry, CacheManager, CacheStatus},
    provision::{ProvisionOptions, Provisioned, provision},
};
