use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::HatchConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["hatch.toml", "hatch.yaml", "hatch.yml", "hatch.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<HatchConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./hatch.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/hatch/hatch.{toml,yaml,yml,json}` (user-global)
///
/// Returns `HatchConfig::default()` if no config file is found or the file
/// fails to parse.
pub fn discover_and_load() -> HatchConfig {
    let mut search = vec![PathBuf::from(".")];
    search.extend(config_dir());
    load_first(&search)
}

/// Load the first config file found in `dirs`, falling back to defaults.
pub fn load_first(dirs: &[PathBuf]) -> HatchConfig {
    let Some(path) = find_config_file(dirs) else {
        debug!("no config file found, using defaults");
        return HatchConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            HatchConfig::default()
        },
    }
}

fn find_config_file(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.is_file())
}

/// Returns the user-global config directory (`~/.config/hatch/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hatch").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<HatchConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
