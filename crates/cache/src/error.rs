use std::path::PathBuf;

use hatch_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] hatch_catalog::Error),

    #[error("invalid plugin name '{name}'")]
    InvalidPluginName { name: String },

    #[error("no write permission for cache root {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to evict cache entry {}: {source}", path.display())]
    Eviction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry {} must be evicted before it is populated", path.display())]
    EntryNotEvicted { path: PathBuf },

    #[error("archive entry '{entry}' escapes the destination directory")]
    PathTraversal { entry: String },

    #[error("extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("plugin '{plugin}' is not cached and offline mode is enabled")]
    NotCached { plugin: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn extraction(reason: impl ToString) -> Self {
        Self::Extraction {
            reason: reason.to_string(),
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
