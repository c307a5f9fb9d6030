//! GitHub REST API implementation of [`RemoteCatalog`].

use std::time::Duration;

use {
    async_trait::async_trait,
    bytes::Bytes,
    hatch_common::{CatalogQuery, PluginRef, Revision},
    reqwest::{Client, Response, StatusCode, header},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    rate_limit::{self, Tier, Verdict},
    remote::{OwnerKind, RemoteCatalog},
};

const PER_PAGE: usize = 100;
const JSON_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("hatch/", env!("CARGO_PKG_VERSION"));
const BRANCH_NOT_FOUND: &str = "Branch not found";

#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    name: String,
    #[serde(default = "default_branch")]
    default_branch: String,
    #[serde(default)]
    archived: bool,
}

fn default_branch() -> String {
    "main".into()
}

#[derive(Debug, Deserialize)]
struct BranchEntry {
    commit: CommitEntry,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    sha: String,
}

/// Catalog client for `api.github.com` or a GitHub Enterprise API root.
pub struct GitHubCatalog {
    http: Client,
    api_url: String,
    token: Option<Secret<String>>,
    max_rate_limit_wait: Option<Duration>,
}

impl GitHubCatalog {
    pub fn new(
        api_url: impl Into<String>,
        token: Option<&Secret<String>>,
        max_rate_limit_wait: Option<Duration>,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::message(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.map(|t| Secret::new(t.expose_secret().clone())),
            max_rate_limit_wait,
        })
    }

    /// Issue a GET, applying the rate-limit policy of
    /// [`rate_limit::verdict`]. Signals that are not retried surface as
    /// [`Error::RateLimited`].
    async fn get(&self, url: &str, accept: &str) -> Result<Response> {
        let mut retried = false;
        loop {
            let mut request = self
                .http
                .get(url)
                .header(header::ACCEPT, accept)
                .header("X-GitHub-Api-Version", "2022-11-28");
            if let Some(token) = &self.token {
                request = request.bearer_auth(token.expose_secret());
            }

            debug!(%url, retried, "catalog request");
            let response = request
                .send()
                .await
                .map_err(|e| Error::remote_unavailable(url, e))?;

            let Some(signal) =
                rate_limit::classify(response.status(), response.headers(), rate_limit::unix_now())
            else {
                return Ok(response);
            };

            let secondary = signal.tier == Tier::Secondary;
            let Verdict::RetryAfter(delay) =
                rate_limit::verdict(signal, retried, self.max_rate_limit_wait)
            else {
                warn!(
                    %url,
                    secondary,
                    retried,
                    retry_after_secs = signal.retry_after.as_secs(),
                    "rate limited, giving up"
                );
                return Err(Error::RateLimited {
                    retry_after: signal.retry_after,
                    secondary,
                });
            };

            warn!(%url, retry_after_secs = delay.as_secs(), "rate limited, retrying once");
            tokio::time::sleep(delay).await;
            retried = true;
        }
    }

    fn repos_url(&self, query: &CatalogQuery, kind: OwnerKind, page: usize) -> String {
        let scope = match kind {
            OwnerKind::Organization => "orgs",
            OwnerKind::User => "users",
        };
        format!(
            "{}/{scope}/{}/repos?per_page={PER_PAGE}&page={page}",
            self.api_url, query.owner
        )
    }
}

async fn error_body(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", body.chars().take(200).collect::<String>())
    }
}

#[async_trait]
impl RemoteCatalog for GitHubCatalog {
    async fn list_plugins(&self, query: &CatalogQuery, kind: OwnerKind) -> Result<Vec<PluginRef>> {
        let mut plugins = Vec::new();
        let mut page = 1;

        loop {
            let url = self.repos_url(query, kind, page);
            let response = self.get(&url, JSON_ACCEPT).await?;
            if !response.status().is_success() {
                return Err(Error::remote_unavailable(url, error_body(response).await));
            }
            let batch: Vec<RepositoryEntry> = response
                .json()
                .await
                .map_err(|e| Error::invalid_response(&url, e))?;
            let batch_len = batch.len();

            plugins.extend(
                batch
                    .iter()
                    .filter(|repo| !repo.archived)
                    .filter_map(|repo| {
                        PluginRef::from_repository(query, &repo.name, &repo.default_branch)
                    }),
            );

            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!(owner = %query.owner, ?kind, count = plugins.len(), "listed plugins");
        Ok(plugins)
    }

    async fn resolve_head(&self, plugin: &PluginRef) -> Result<Revision> {
        let url = format!(
            "{}/repos/{}/{}/branches/{}",
            self.api_url, plugin.owner, plugin.repository_name, plugin.default_branch
        );
        let response = self.get(&url, JSON_ACCEPT).await?;
        match response.status() {
            status if status.is_success() => {},
            // GitHub answers both cases with 404; only the message differs.
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                if body.contains(BRANCH_NOT_FOUND) {
                    return Err(Error::BranchNotFound {
                        repository: plugin.slug(),
                        branch: plugin.default_branch.clone(),
                    });
                }
                return Err(Error::RepositoryNotFound {
                    repository: plugin.slug(),
                });
            },
            _ => return Err(Error::remote_unavailable(url, error_body(response).await)),
        }

        let branch: BranchEntry = response
            .json()
            .await
            .map_err(|e| Error::invalid_response(&url, e))?;
        let revision =
            Revision::parse(branch.commit.sha).map_err(|e| Error::invalid_response(&url, e))?;
        debug!(plugin = %plugin.plugin_name, revision = %revision, "resolved head");
        Ok(revision)
    }

    async fn download_archive(&self, plugin: &PluginRef, revision: &Revision) -> Result<Bytes> {
        let url = format!(
            "{}/repos/{}/{}/tarball/{}",
            self.api_url, plugin.owner, plugin.repository_name, revision
        );
        let download_failed = |reason: String| Error::DownloadFailed {
            repository: plugin.slug(),
            revision: revision.to_string(),
            reason,
        };

        let response = match self.get(&url, "application/octet-stream").await {
            Ok(response) => response,
            Err(Error::RemoteUnavailable { reason, .. }) => return Err(download_failed(reason)),
            Err(e) => return Err(e),
        };
        match response.status() {
            status if status.is_success() => {},
            StatusCode::NOT_FOUND => {
                return Err(Error::RepositoryNotFound {
                    repository: plugin.slug(),
                });
            },
            _ => return Err(download_failed(error_body(response).await)),
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_failed(e.to_string()))?;
        info!(
            plugin = %plugin.plugin_name,
            revision = %revision.short(),
            size = bytes.len(),
            "downloaded snapshot"
        );
        Ok(bytes)
    }
}
