mod cache_commands;
mod output;
mod prompt;
mod scaffold;

use std::{collections::BTreeMap, path::PathBuf};

use {
    clap::{Parser, Subcommand},
    hatch_cache::CacheManager,
    hatch_catalog::GitHubCatalog,
    hatch_config::{CliOverrides, Settings},
    hatch_plugins::InstallerGateway,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::{
    prompt::TerminalPrompter,
    scaffold::{Outcome, Request, Scaffold},
};

#[derive(Parser)]
#[command(
    name = "hatch",
    version,
    about = "hatch: scaffold projects from a catalog of generator plugins"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Plugin to run (prompted for when omitted or unknown).
    plugin: Option<String>,

    /// Sub-module of the plugin to run (prompted for when omitted).
    subcommand: Option<String>,

    /// Arguments forwarded verbatim to the sub-module (after `--`).
    #[arg(last = true)]
    args: Vec<String>,

    /// Options forwarded to the sub-module.
    #[arg(long = "opt", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    options: Vec<(String, String)>,

    /// List available plugins and exit.
    #[arg(long)]
    list: bool,

    /// Show installer output and debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use cached plugins without checking for updates.
    #[arg(long, global = true)]
    skip_update: bool,

    /// Re-download the plugin even when the cache is current.
    #[arg(long, global = true, conflicts_with = "offline")]
    force_update: bool,

    /// Never access the network; only cached plugins are available.
    #[arg(long, global = true)]
    offline: bool,

    /// GitHub token used for API requests.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    gh_token: Option<String>,

    /// Owner whose repositories form the plugin catalog.
    #[arg(long, global = true)]
    gh_org: Option<String>,

    /// Repository name prefix that marks a plugin.
    #[arg(long, global = true)]
    plugin_prefix: Option<String>,

    /// Additional owner (organization or user) to merge into the catalog.
    #[arg(long, global = true)]
    add_gh_org: Option<String>,

    /// Repository name prefix for the additional owner.
    #[arg(long, global = true)]
    add_plugin_prefix: Option<String>,

    /// Directory that holds cached plugins.
    #[arg(long, global = true, env = "HATCH_PLUGINS_HOME")]
    plugins_home: Option<PathBuf>,

    /// Configuration file (overrides discovery of `hatch.toml` and friends).
    #[arg(long, global = true, env = "HATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plugin cache maintenance.
    Cache {
        #[command(subcommand)]
        action: cache_commands::CacheAction,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_telemetry(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            token: self.gh_token.clone(),
            owner: self.gh_org.clone(),
            prefix: self.plugin_prefix.clone(),
            additional_owner: self.add_gh_org.clone(),
            additional_prefix: self.add_plugin_prefix.clone(),
            plugins_home: self.plugins_home.clone(),
            verbose: self.verbose,
            skip_update: self.skip_update,
            force_update: self.force_update,
            offline: self.offline,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "hatch starting");

    let config = match &cli.config {
        Some(path) => hatch_config::load_config(path)?,
        None => hatch_config::discover_and_load(),
    };
    let settings = Settings::resolve(cli.overrides(), config);

    let cache = match CacheManager::open(settings.cache_dir.clone(), settings.skip_update) {
        Ok(cache) => cache,
        Err(e) => {
            output::error(&format!("cannot use the plugin cache: {e}"));
            return Ok(());
        },
    };

    if let Some(Commands::Cache { action }) = cli.command {
        return cache_commands::handle_cache(action, &cache).await;
    }

    let remote = GitHubCatalog::new(
        settings.api_url.clone(),
        settings.token.as_ref(),
        settings.max_rate_limit_wait,
    )?;
    let installer = InstallerGateway::new(
        settings.install_command.clone(),
        settings.manifest_file.clone(),
        settings.verbose,
    );
    let flow = Scaffold {
        settings: &settings,
        remote: &remote,
        cache: &cache,
        installer: &installer,
        prompter: &TerminalPrompter,
    };

    let request = Request {
        plugin: cli.plugin,
        subcommand: cli.subcommand,
        args: cli.args,
        options: cli.options.into_iter().collect::<BTreeMap<_, _>>(),
        list_only: cli.list,
        cwd: std::env::current_dir()?,
    };

    match flow.run(request).await {
        Outcome::Listed(plugins) => {
            if plugins.is_empty() {
                println!("No plugins found.");
            }
            for plugin in &plugins {
                println!("  {:<24} {}", plugin.plugin_name, plugin.slug());
            }
        },
        Outcome::Completed { plugin, .. } => {
            info!(plugin = %plugin, "scaffolding finished");
        },
        Outcome::Aborted(message) => output::error(&message),
    }

    Ok(())
}
