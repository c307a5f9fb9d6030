//! Process-scoped settings: command-line flags layered over the persisted
//! config, layered over built-in defaults.

use std::{path::PathBuf, time::Duration};

use {
    hatch_common::CatalogQuery,
    secrecy::{ExposeSecret, Secret},
};

use crate::schema::HatchConfig;

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub prefix: Option<String>,
    pub additional_owner: Option<String>,
    pub additional_prefix: Option<String>,
    pub plugins_home: Option<PathBuf>,
    pub verbose: bool,
    pub skip_update: bool,
    pub force_update: bool,
    pub offline: bool,
}

/// Resolved settings, built once at start-up and passed by reference.
#[derive(Debug)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<Secret<String>>,
    pub primary: CatalogQuery,
    pub additional: Option<CatalogQuery>,
    pub cache_dir: Option<PathBuf>,
    pub install_command: Vec<String>,
    pub manifest_file: String,
    /// Ceiling on the honoured rate-limit backoff; `None` honours any delay.
    pub max_rate_limit_wait: Option<Duration>,
    pub verbose: bool,
    pub skip_update: bool,
    pub force_update: bool,
    pub offline: bool,
}

impl Settings {
    pub fn resolve(cli: CliOverrides, config: HatchConfig) -> Self {
        let token = cli
            .token
            .filter(|t| !t.is_empty())
            .map(Secret::new)
            .or(config.github.token)
            .filter(|t| !t.expose_secret().is_empty());

        let prefix = cli.prefix.unwrap_or(config.catalog.prefix);
        let primary = CatalogQuery::new(cli.owner.unwrap_or(config.catalog.owner), prefix.clone());

        let additional = cli
            .additional_owner
            .or(config.catalog.additional_owner)
            .filter(|owner| !owner.is_empty())
            .map(|owner| {
                let prefix = cli
                    .additional_prefix
                    .or(config.catalog.additional_prefix)
                    .unwrap_or(prefix);
                CatalogQuery::new(owner, prefix)
            });

        Self {
            api_url: config.github.api_url.trim_end_matches('/').to_string(),
            token,
            primary,
            additional,
            cache_dir: cli.plugins_home.or(config.cache.dir),
            install_command: config.install.command,
            manifest_file: config.install.manifest_file,
            max_rate_limit_wait: config.rate_limit.max_wait_secs.map(Duration::from_secs),
            verbose: cli.verbose,
            // Offline never consults the remote, so nothing can be checked.
            skip_update: cli.skip_update || cli.offline,
            force_update: cli.force_update && !cli.offline,
            offline: cli.offline,
        }
    }
}
