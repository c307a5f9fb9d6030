//! CLI commands for the local plugin cache.

use {clap::Subcommand, hatch_cache::CacheManager};

use crate::output;

#[derive(Subcommand)]
pub enum CacheAction {
    /// List cached plugins and the revision each one reflects.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Evict one cached plugin, or all of them.
    Clean {
        /// Plugin name; omit to clear the whole cache.
        plugin: Option<String>,
    },
}

pub async fn handle_cache(action: CacheAction, cache: &CacheManager) -> anyhow::Result<()> {
    match action {
        CacheAction::List { json } => {
            let entries = cache.entries()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No cached plugins in {}.", cache.root().display());
                return Ok(());
            }
            for entry in &entries {
                let revision = entry
                    .freshness_marker
                    .as_ref()
                    .map_or_else(|| "stale".to_string(), |r| r.short().to_string());
                println!(
                    "  {name:<24} {revision:<8} {path}",
                    name = entry.plugin_name,
                    path = entry.local_path.display()
                );
            }
        },
        CacheAction::Clean { plugin: Some(name) } => {
            cache.evict(&name).await?;
            output::success(&format!("Evicted '{name}'"));
        },
        CacheAction::Clean { plugin: None } => {
            let entries = cache.entries()?;
            for entry in &entries {
                cache.evict(&entry.plugin_name).await?;
            }
            output::success(&format!("Evicted {} cached plugin(s)", entries.len()));
        },
    }
    Ok(())
}
