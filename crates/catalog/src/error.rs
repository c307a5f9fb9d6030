use std::time::Duration;

use hatch_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("remote catalog unavailable ({target}): {reason}")]
    RemoteUnavailable { target: String, reason: String },

    #[error(
        "{tier} rate limit exceeded (retry after {}s); supply an authentication token with --gh-token or GITHUB_TOKEN",
        retry_after.as_secs(),
        tier = if *secondary { "secondary" } else { "API" }
    )]
    RateLimited {
        retry_after: Duration,
        secondary: bool,
    },

    #[error("repository '{repository}' not found")]
    RepositoryNotFound { repository: String },

    #[error("branch '{branch}' not found in repository '{repository}'")]
    BranchNotFound { repository: String, branch: String },

    #[error("failed to download {repository}@{revision}: {reason}")]
    DownloadFailed {
        repository: String,
        revision: String,
        reason: String,
    },

    #[error("unexpected response from {target}: {reason}")]
    InvalidResponse { target: String, reason: String },

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
    pub fn remote_unavailable(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::RemoteUnavailable {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_response(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidResponse {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Rate-limit errors are never masked by fallbacks.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

hatch_common::impl_context!();
