//! Plugin runtime: dependency installation and sub-module dispatch.
//!
//! A cached plugin exposes its sub-modules as `generators/<dir>/generator.toml`
//! descriptors. Discovery turns them into [`SubModule`] capabilities; the
//! host only ever talks to that trait, never to a plugin's internals.

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod installer;
pub mod select;
pub mod shell;
pub mod submodule;

pub use {
    discovery::{SubModuleSet, discover},
    error::{Error, Result},
    installer::{InstallOutcome, InstallerGateway},
    select::{DEFAULT_SUBCOMMAND, Prompter, choose, select_and_invoke},
    shell::ShellSubModule,
    submodule::{InvocationContext, SubModule, subcommand_from_namespace},
};
