//! Value types passed between the catalog, cache and plugin crates.
//!
//! None of these carry shared mutable state; they are cloned freely.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ── CatalogQuery ────────────────────────────────────────────────────────────

/// Which remote account to list, and the name prefix marking a repository
/// as a plugin (e.g. `generator-ui5-`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub owner: String,
    pub name_prefix: String,
}

impl CatalogQuery {
    pub fn new(owner: impl Into<String>, name_prefix: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name_prefix: name_prefix.into(),
        }
    }

    /// Plugin name for `repository_name`, or `None` when the repository does
    /// not follow the naming convention. A repository named exactly like the
    /// prefix yields no plugin.
    pub fn plugin_name<'a>(&self, repository_name: &'a str) -> Option<&'a str> {
        repository_name
            .strip_prefix(self.name_prefix.as_str())
            .filter(|name| !name.is_empty())
    }
}

// ── PluginRef ───────────────────────────────────────────────────────────────

/// A remote repository that follows the plugin naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRef {
    pub owner: String,
    pub repository_name: String,
    pub default_branch: String,
    pub plugin_name: String,
}

impl PluginRef {
    /// Build a plugin reference for a listed repository, applying the
    /// query's prefix filter.
    pub fn from_repository(
        query: &CatalogQuery,
        repository_name: &str,
        default_branch: &str,
    ) -> Option<Self> {
        let plugin_name = query.plugin_name(repository_name)?;
        Some(Self {
            owner: query.owner.clone(),
            repository_name: repository_name.to_string(),
            default_branch: default_branch.to_string(),
            plugin_name: plugin_name.to_string(),
        })
    }

    /// `owner/repository` slug.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repository_name)
    }
}

// ── Revision ────────────────────────────────────────────────────────────────

/// Commit identifier a plugin was resolved to.
///
/// Restricted to ASCII alphanumerics because it is embedded in URL paths and
/// in on-disk marker file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidRevision { value });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, for display.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Revision {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Revision> for String {
    fn from(rev: Revision) -> Self {
        rev.0
    }
}
