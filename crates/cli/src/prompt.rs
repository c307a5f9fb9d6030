//! Terminal prompts backed by `dialoguer`.

use {
    dialoguer::{Select, theme::ColorfulTheme},
    hatch_plugins::{Error, Prompter, Result},
};

use crate::output;

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .map_err(|e| Error::message(format!("selection aborted: {e}")))
    }

    fn notice(&self, message: &str) {
        output::warning(message);
    }
}
