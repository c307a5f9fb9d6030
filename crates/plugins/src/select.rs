//! Choosing a sub-module and handing it the invocation context.

use tracing::{info, warn};

use crate::{
    Error, Result,
    discovery::SubModuleSet,
    submodule::{InvocationContext, SubModule},
};

/// Subcommand pre-selected in the prompt when present.
pub const DEFAULT_SUBCOMMAND: &str = "app";

/// Interactive collaborator used when the choice is ambiguous.
pub trait Prompter: Send + Sync {
    /// Ask the user to pick one of `items`; returns the chosen index.
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    /// Show a non-fatal diagnostic to the user.
    fn notice(&self, message: &str);
}

/// Pick the index of the sub-module to run.
///
/// An exact `hint` match wins without prompting. An unknown hint is reported
/// through the prompter and ignored. A single sub-module is chosen directly;
/// otherwise the user is prompted with [`DEFAULT_SUBCOMMAND`] (or the first
/// entry) pre-selected.
pub fn choose(set: &SubModuleSet, hint: Option<&str>, prompter: &dyn Prompter) -> Result<usize> {
    if let Some(hint) = hint {
        if let Some(index) = set.position(hint) {
            return Ok(index);
        }
        let err = Error::SubcommandNotFound {
            name: hint.to_string(),
            available: set.subcommands(),
        };
        warn!(plugin = set.plugin_name(), %err, "ignoring subcommand hint");
        prompter.notice(&err.to_string());
    }

    if set.len() == 1 {
        return Ok(0);
    }

    let default = set.position(DEFAULT_SUBCOMMAND).unwrap_or(0);
    let items: Vec<String> = set.iter().map(menu_label).collect();
    let picked = prompter.select(
        &format!("Which generator of '{}' do you want to run?", set.plugin_name()),
        &items,
        default,
    )?;
    if picked >= set.len() {
        return Err(Error::message(format!("selection {picked} is out of range")));
    }
    Ok(picked)
}

/// Choose a sub-module and run it to completion.
pub async fn select_and_invoke(
    set: &SubModuleSet,
    hint: Option<&str>,
    context: &InvocationContext,
    prompter: &dyn Prompter,
) -> Result<()> {
    let index = choose(set, hint, prompter)?;
    let module = set
        .get(index)
        .ok_or_else(|| Error::message(format!("selection {index} is out of range")))?;
    info!(
        plugin = set.plugin_name(),
        subcommand = module.subcommand_name(),
        "invoking sub-module"
    );
    module.run(context).await
}

fn menu_label(module: &dyn SubModule) -> String {
    let sub = module.subcommand_name();
    if module.display_name() == sub {
        sub.to_string()
    } else {
        format!("{} ({sub})", module.display_name())
    }
}
