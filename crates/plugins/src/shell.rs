//! Sub-module backed by an external command.
//!
//! The command runs through `sh -c` in the caller's working directory with
//! stdio inherited, so interactive generators can talk to the user directly.
//! Positional arguments follow as `$1..`; the full [`InvocationContext`] is
//! passed as JSON in `HATCH_INVOCATION`.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    tokio::process::Command,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    submodule::{InvocationContext, SubModule},
};

pub const ENV_EMBEDDED: &str = "HATCH_EMBEDDED";
pub const ENV_GENERATOR_DIR: &str = "HATCH_GENERATOR_DIR";
pub const ENV_PLUGIN_DIR: &str = "HATCH_PLUGIN_DIR";
pub const ENV_INVOCATION: &str = "HATCH_INVOCATION";

/// `$0` seen by the command.
const SCRIPT_NAME: &str = "hatch";

#[derive(Debug, Clone)]
pub struct ShellSubModule {
    pub(crate) namespace: String,
    pub(crate) display_name: String,
    pub(crate) hidden: bool,
    pub(crate) command: String,
    pub(crate) generator_dir: PathBuf,
    pub(crate) plugin_dir: PathBuf,
}

impl ShellSubModule {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn generator_dir(&self) -> &Path {
        &self.generator_dir
    }
}

#[async_trait]
impl SubModule for ShellSubModule {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn hidden(&self) -> bool {
        self.hidden
    }

    async fn run(&self, context: &InvocationContext) -> Result<()> {
        let invocation = serde_json::to_string(context)?;

        info!(namespace = %self.namespace, command = %self.command, "running sub-module");
        debug!(args = ?context.args, cwd = %context.cwd.display(), "sub-module context");

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .arg(SCRIPT_NAME)
            .args(&context.args)
            .env(ENV_GENERATOR_DIR, &self.generator_dir)
            .env(ENV_PLUGIN_DIR, &self.plugin_dir)
            .env(ENV_INVOCATION, invocation);
        if context.embedded {
            command.env(ENV_EMBEDDED, "1");
        }
        if !context.cwd.as_os_str().is_empty() {
            command.current_dir(&context.cwd);
        }

        let status = command.status().await.map_err(|source| Error::Spawn {
            command: self.command.clone(),
            source,
        })?;

        debug!(namespace = %self.namespace, code = ?status.code(), "sub-module finished");
        if !status.success() {
            return Err(Error::SubModuleFailed {
                name: self.namespace.clone(),
                code: status.code(),
            });
        }
        Ok(())
    }
}
