//! Sub-module discovery inside a cached plugin.
//!
//! Scans `generators/*/generator.toml` in sorted directory order and builds
//! the visible [`SubModuleSet`]. Descriptors that fail to parse are skipped
//! with a warning so one broken generator does not hide the rest.

use std::path::Path;

use tracing::{debug, warn};

use crate::{
    Error, Result,
    descriptor::{DESCRIPTOR_FILE, GENERATORS_DIR, parse_descriptor},
    submodule::SubModule,
};

/// Non-hidden sub-modules of one plugin with unique subcommand names.
/// Never empty.
pub struct SubModuleSet {
    plugin_name: String,
    modules: Vec<Box<dyn SubModule>>,
}

impl std::fmt::Debug for SubModuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubModuleSet")
            .field("plugin_name", &self.plugin_name)
            .field("subcommands", &self.subcommands())
            .finish()
    }
}

impl SubModuleSet {
    /// Drop hidden entries and later duplicates of a subcommand name.
    pub fn new(plugin_name: impl Into<String>, candidates: Vec<Box<dyn SubModule>>) -> Result<Self> {
        let plugin_name = plugin_name.into();
        let mut modules: Vec<Box<dyn SubModule>> = Vec::with_capacity(candidates.len());

        for module in candidates {
            if module.hidden() {
                debug!(namespace = module.namespace(), "skipping hidden sub-module");
                continue;
            }
            if modules
                .iter()
                .any(|m| m.subcommand_name() == module.subcommand_name())
            {
                warn!(
                    plugin = %plugin_name,
                    namespace = module.namespace(),
                    "duplicate subcommand name, ignoring"
                );
                continue;
            }
            modules.push(module);
        }

        if modules.is_empty() {
            return Err(Error::NoSubModulesAvailable {
                plugin: plugin_name,
            });
        }
        Ok(Self {
            plugin_name,
            modules,
        })
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn SubModule> {
        self.modules.get(index).map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SubModule> {
        self.modules.iter().map(AsRef::as_ref)
    }

    pub fn position(&self, subcommand: &str) -> Option<usize> {
        self.modules
            .iter()
            .position(|m| m.subcommand_name() == subcommand)
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.iter().map(|m| m.subcommand_name().to_string()).collect()
    }
}

/// Discover the sub-modules of the plugin extracted at `plugin_dir`.
pub fn discover(plugin_dir: &Path, plugin_name: &str) -> Result<SubModuleSet> {
    let root = plugin_dir.join(GENERATORS_DIR);
    let mut dirs = match std::fs::read_dir(&root) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect::<Vec<_>>(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    dirs.sort();

    let mut candidates: Vec<Box<dyn SubModule>> = Vec::new();
    for dir in dirs {
        let descriptor_path = dir.join(DESCRIPTOR_FILE);
        if !descriptor_path.is_file() {
            continue;
        }
        let content = match std::fs::read_to_string(&descriptor_path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %descriptor_path.display(), %e, "failed to read descriptor");
                continue;
            },
        };
        match parse_descriptor(&content, &descriptor_path) {
            Ok(descriptor) => {
                candidates.push(Box::new(descriptor.into_submodule(plugin_name, &dir, plugin_dir)));
            },
            Err(e) => warn!(%e, "skipping sub-module"),
        }
    }

    SubModuleSet::new(plugin_name, candidates)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write_generator(root: &Path, dir: &str, body: &str) {
        let gen_dir = root.join(GENERATORS_DIR).join(dir);
        std::fs::create_dir_all(&gen_dir).unwrap();
        std::fs::write(gen_dir.join(DESCRIPTOR_FILE), body).unwrap();
    }

    #[test]
    fn hidden_sub_modules_are_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        write_generator(tmp.path(), "a", "command = \"true\"");
        write_generator(tmp.path(), "b", "hidden = true\ncommand = \"true\"");
        write_generator(tmp.path(), "c", "command = \"true\"");

        let set = discover(tmp.path(), "demo").unwrap();

        assert_eq!(set.subcommands(), vec!["a", "c"]);
    }

    #[test]
    fn directories_are_visited_in_sorted_order() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["zeta", "app", "mid"] {
            write_generator(tmp.path(), dir, "command = \"true\"");
        }
        let set = discover(tmp.path(), "demo").unwrap();
        assert_eq!(set.subcommands(), vec!["app", "mid", "zeta"]);
    }

    #[test]
    fn duplicate_subcommands_keep_first() {
        let tmp = tempfile::tempdir().unwrap();
        write_generator(tmp.path(), "one", "namespace = \"x:app\"\ncommand = \"true\"");
        write_generator(tmp.path(), "two", "namespace = \"y:app\"\ncommand = \"true\"");

        let set = discover(tmp.path(), "demo").unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().namespace(), "x:app");
    }

    #[test]
    fn broken_descriptor_does_not_hide_others() {
        let tmp = tempfile::tempdir().unwrap();
        write_generator(tmp.path(), "bad", "this is not toml = =");
        write_generator(tmp.path(), "good", "command = \"true\"");

        let set = discover(tmp.path(), "demo").unwrap();
        assert_eq!(set.subcommands(), vec!["good"]);
    }

    #[test]
    fn only_hidden_is_no_sub_modules() {
        let tmp = tempfile::tempdir().unwrap();
        write_generator(tmp.path(), "internal", "hidden = true\ncommand = \"true\"");

        let err = discover(tmp.path(), "demo").unwrap_err();
        assert!(matches!(err, Error::NoSubModulesAvailable { ref plugin } if plugin == "demo"));
    }

    #[test]
    fn missing_generators_dir_is_no_sub_modules() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover(tmp.path(), "demo").unwrap_err();
        assert!(matches!(err, Error::NoSubModulesAvailable { .. }));
    }

    #[test]
    fn directories_without_descriptor_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(GENERATORS_DIR).join("templates")).unwrap();
        write_generator(tmp.path(), "app", "command = \"true\"");

        let set = discover(tmp.path(), "demo").unwrap();
        assert_eq!(set.subcommands(), vec!["app"]);
    }
}
