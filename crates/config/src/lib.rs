//! Configuration loading and layering.
//!
//! Config files: `hatch.toml`, `hatch.yaml`, or `hatch.json`
//! Searched in `./` then `~/.config/hatch/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values. Command-line
//! flags are layered on top through [`Settings::resolve`].

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod settings;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{CacheConfig, CatalogConfig, GithubConfig, HatchConfig, InstallConfig, RateLimitConfig},
    settings::{CliOverrides, Settings},
};
