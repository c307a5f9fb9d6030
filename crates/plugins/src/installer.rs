//! Dependency installer gateway.
//!
//! Runs the configured package-install command inside a freshly populated
//! cache entry and waits for it to exit. A failing install is reported but
//! leaves the entry in place.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use {
    tokio::process::Command,
    tracing::{debug, info},
};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The entry has no manifest file (or no command is configured).
    Skipped,
    Completed,
}

#[derive(Debug, Clone)]
pub struct InstallerGateway {
    command: Vec<String>,
    manifest_file: PathBuf,
    verbose: bool,
}

impl InstallerGateway {
    pub fn new(command: Vec<String>, manifest_file: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            command,
            manifest_file: manifest_file.into(),
            verbose,
        }
    }

    /// Spawn the install command in `dir`. Output is inherited when verbose,
    /// discarded otherwise.
    pub async fn install_dependencies(&self, dir: &Path) -> Result<InstallOutcome> {
        let Some((program, args)) = self.command.split_first() else {
            debug!("no install command configured");
            return Ok(InstallOutcome::Skipped);
        };
        if !dir.join(&self.manifest_file).is_file() {
            debug!(dir = %dir.display(), manifest = %self.manifest_file.display(), "no manifest, skipping install");
            return Ok(InstallOutcome::Skipped);
        }

        let rendered = self.command.join(" ");
        info!(dir = %dir.display(), command = %rendered, "installing plugin dependencies");

        let (stdout, stderr) = if self.verbose {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        let status = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .await
            .map_err(|source| Error::Spawn {
                command: rendered.clone(),
                source,
            })?;

        if !status.success() {
            return Err(Error::InstallFailed {
                dir: dir.to_path_buf(),
                code: status.code(),
            });
        }
        Ok(InstallOutcome::Completed)
    }
}
