//! `generator.toml` parsing.
//!
//! Each sub-module of a plugin lives in its own directory under
//! `generators/`, described by a small TOML file:
//! ```text
//! namespace    = "ui5:app"        # default "<plugin>:<dir>"
//! display_name = "Create an app"  # default: the subcommand name
//! hidden       = false
//! command      = "node index.js"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::{
    Error, Result,
    shell::ShellSubModule,
    submodule::{NAMESPACE_SEPARATOR, subcommand_from_namespace},
};

pub const GENERATORS_DIR: &str = "generators";
pub const DESCRIPTOR_FILE: &str = "generator.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorDescriptor {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub command: String,
}

/// Parse descriptor text read from `path`.
pub fn parse_descriptor(content: &str, path: &Path) -> Result<GeneratorDescriptor> {
    let descriptor: GeneratorDescriptor =
        toml::from_str(content).map_err(|e| Error::invalid_descriptor(path, e.message()))?;
    if descriptor.command.trim().is_empty() {
        return Err(Error::invalid_descriptor(path, "`command` must not be empty"));
    }
    if let Some(ns) = &descriptor.namespace
        && subcommand_from_namespace(ns).is_empty()
    {
        return Err(Error::invalid_descriptor(
            path,
            format!("namespace '{ns}' has an empty subcommand"),
        ));
    }
    Ok(descriptor)
}

impl GeneratorDescriptor {
    /// Bind the descriptor found in `generator_dir` to a runnable sub-module.
    pub fn into_submodule(
        self,
        plugin_name: &str,
        generator_dir: &Path,
        plugin_dir: &Path,
    ) -> ShellSubModule {
        let dir_name = generator_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let namespace = self
            .namespace
            .unwrap_or_else(|| format!("{plugin_name}{NAMESPACE_SEPARATOR}{dir_name}"));
        let display_name = self
            .display_name
            .unwrap_or_else(|| subcommand_from_namespace(&namespace).to_string());

        ShellSubModule {
            namespace,
            display_name,
            hidden: self.hidden,
            command: self.command,
            generator_dir: generator_dir.to_path_buf(),
            plugin_dir: plugin_dir.to_path_buf(),
        }
    }
}
