//! The scaffolding flow: catalog → provision → install → discover → invoke.
//!
//! Every failure along the way ends the flow with a diagnostic instead of an
//! error exit; only the sub-module itself decides what happens to the user's
//! working directory.

use std::{collections::BTreeMap, path::PathBuf};

use {
    anyhow::{Context, bail},
    hatch_cache::{CacheManager, ProvisionOptions, provision},
    hatch_catalog::{RemoteCatalog, list_catalog},
    hatch_common::{CatalogQuery, PluginRef},
    hatch_config::Settings,
    hatch_plugins::{
        InstallOutcome, InstallerGateway, InvocationContext, Prompter, discover, select_and_invoke,
    },
    tracing::{debug, warn},
};

use crate::output;

/// What the user asked for on the command line.
#[derive(Debug, Default)]
pub struct Request {
    pub plugin: Option<String>,
    pub subcommand: Option<String>,
    pub args: Vec<String>,
    pub options: BTreeMap<String, String>,
    pub list_only: bool,
    pub cwd: PathBuf,
}

#[derive(Debug)]
pub enum Outcome {
    Listed(Vec<PluginRef>),
    Completed { plugin: String, fetched: bool },
    Aborted(String),
}

pub struct Scaffold<'a> {
    pub settings: &'a Settings,
    pub remote: &'a dyn RemoteCatalog,
    pub cache: &'a CacheManager,
    pub installer: &'a InstallerGateway,
    pub prompter: &'a dyn Prompter,
}

impl Scaffold<'_> {
    pub async fn run(&self, request: Request) -> Outcome {
        match self.try_run(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(error = ?e, "scaffolding aborted");
                Outcome::Aborted(format!("{e:#}"))
            },
        }
    }

    async fn try_run(&self, request: Request) -> anyhow::Result<Outcome> {
        let plugins = self.catalog().await?;
        if request.list_only {
            return Ok(Outcome::Listed(plugins));
        }
        if plugins.is_empty() {
            bail!(
                "no plugins found for '{}' with prefix '{}'",
                self.settings.primary.owner,
                self.settings.primary.name_prefix
            );
        }

        let plugin = self.pick_plugin(&plugins, request.plugin.as_deref())?;
        let name = plugin.plugin_name.clone();

        let spinner = output::spinner(&format!("Preparing plugin '{name}'"));
        let provisioned = provision(self.remote, self.cache, &plugin, ProvisionOptions {
            force_update: self.settings.force_update,
            offline: self.settings.offline,
        })
        .await;
        spinner.finish_and_clear();
        let provisioned =
            provisioned.with_context(|| format!("failed to prepare plugin '{name}'"))?;

        if provisioned.fetched {
            let spinner = output::spinner("Installing plugin dependencies");
            let installed = self.installer.install_dependencies(&provisioned.path).await;
            spinner.finish_and_clear();
            match installed {
                Ok(InstallOutcome::Completed) => {
                    output::info(&format!("Installed dependencies for '{name}'"));
                },
                Ok(InstallOutcome::Skipped) => {},
                Err(e) => {
                    warn!(plugin = %name, error = %e, "dependency install failed");
                    output::warning(&format!(
                        "{e}; the plugin is kept at {} for inspection",
                        provisioned.path.display()
                    ));
                },
            }
        }

        let modules = discover(&provisioned.path, &name)?;
        let context = InvocationContext::embedded(request.args, request.options, request.cwd);
        select_and_invoke(
            &modules,
            request.subcommand.as_deref(),
            &context,
            self.prompter,
        )
        .await?;

        Ok(Outcome::Completed {
            plugin: name,
            fetched: provisioned.fetched,
        })
    }

    async fn catalog(&self) -> anyhow::Result<Vec<PluginRef>> {
        if self.settings.offline {
            return self.cached_catalog();
        }
        let spinner = output::spinner("Looking up available plugins");
        let listed = list_catalog(
            self.remote,
            &self.settings.primary,
            self.settings.additional.as_ref(),
        )
        .await;
        spinner.finish_and_clear();
        listed.context("failed to list available plugins")
    }

    /// Populated cache entries stand in for the catalog when offline.
    fn cached_catalog(&self) -> anyhow::Result<Vec<PluginRef>> {
        let query: &CatalogQuery = &self.settings.primary;
        let entries = self.cache.entries().context("failed to read the plugin cache")?;
        Ok(entries
            .into_iter()
            .map(|entry| PluginRef {
                owner: query.owner.clone(),
                repository_name: format!("{}{}", query.name_prefix, entry.plugin_name),
                default_branch: String::new(),
                plugin_name: entry.plugin_name,
            })
            .collect())
    }

    fn pick_plugin(
        &self,
        plugins: &[PluginRef],
        requested: Option<&str>,
    ) -> anyhow::Result<PluginRef> {
        if let Some(name) = requested {
            if let Some(found) = plugins.iter().find(|p| p.plugin_name == name) {
                return Ok(found.clone());
            }
            self.prompter
                .notice(&format!("plugin '{name}' is not in the catalog"));
        }
        if let [only] = plugins {
            return Ok(only.clone());
        }

        let items: Vec<String> = plugins
            .iter()
            .map(|p| format!("{} ({})", p.plugin_name, p.slug()))
            .collect();
        let index = self
            .prompter
            .select("Which plugin do you want to use?", &items, 0)?;
        plugins
            .get(index)
            .cloned()
            .with_context(|| format!("selection {index} is out of range"))
    }
}
