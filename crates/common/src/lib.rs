//! Shared value types and error helpers used across all hatch crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{CatalogQuery, PluginRef, Revision},
};
