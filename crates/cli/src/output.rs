//! Terminal output helpers. Diagnostics go to stderr, results to stdout.

use std::time::Duration;

use {
    console::style,
    indicatif::{ProgressBar, ProgressStyle},
};

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Steady spinner on stderr; hidden automatically when stderr is not a
/// terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
