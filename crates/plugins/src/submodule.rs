//! The capability every invocable unit inside a plugin exposes.

use std::{collections::BTreeMap, path::PathBuf};

use {async_trait::async_trait, serde::Serialize};

use crate::Result;

/// Separator between a namespace's scope and its subcommand.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Arguments and options forwarded to a sub-module.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvocationContext {
    pub args: Vec<String>,
    pub options: BTreeMap<String, String>,
    /// Set when the sub-module runs inside the host rather than standalone.
    pub embedded: bool,
    /// Directory the user invoked the host from.
    pub cwd: PathBuf,
}

impl InvocationContext {
    /// Context for a delegated call from the host.
    pub fn embedded(args: Vec<String>, options: BTreeMap<String, String>, cwd: PathBuf) -> Self {
        Self {
            args,
            options,
            embedded: true,
            cwd,
        }
    }
}

#[async_trait]
pub trait SubModule: Send + Sync {
    /// Fully scoped name, e.g. `ui5:app`.
    fn namespace(&self) -> &str;

    fn display_name(&self) -> &str;

    fn hidden(&self) -> bool;

    /// The namespace with its scope removed.
    fn subcommand_name(&self) -> &str {
        subcommand_from_namespace(self.namespace())
    }

    /// Run to completion with `context`.
    async fn run(&self, context: &InvocationContext) -> Result<()>;
}

/// `"ui5:app"` → `"app"`, `"a:b:c"` → `"c"`, `"app"` → `"app"`.
pub fn subcommand_from_namespace(namespace: &str) -> &str {
    namespace
        .rsplit_once(NAMESPACE_SEPARATOR)
        .map_or(namespace, |(_, sub)| sub)
}
