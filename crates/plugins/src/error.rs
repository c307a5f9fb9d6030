use std::path::{Path, PathBuf};

use hatch_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("dependency install in {} exited with {}", dir.display(), code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    InstallFailed { dir: PathBuf, code: Option<i32> },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin '{plugin}' exposes no sub-modules")]
    NoSubModulesAvailable { plugin: String },

    #[error("no sub-module named '{name}' (available: {})", available.join(", "))]
    SubcommandNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid sub-module descriptor {}: {reason}", path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    #[error("sub-module '{name}' exited with {}", code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    SubModuleFailed { name: String, code: Option<i32> },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn invalid_descriptor(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

hatch_common::impl_context!();
