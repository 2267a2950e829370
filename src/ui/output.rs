//! ui::output
//!
//! Console output.
//!
//! # Design
//!
//! Progress lines start with `>> ` so they stand out from the output of the
//! tools kubedeploy runs (`docker build`, `kubectl`). Everything except errors
//! respects `--quiet`. Diagnostics belong in `tracing`, not here.

use std::fmt::Display;

/// Prefix for progress lines.
pub const PROMPT: &str = ">> ";

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - errors only
    Quiet,
    /// Normal mode - progress lines
    Normal,
    /// Debug mode - progress lines plus diagnostics
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Format a progress line, indented by `indent` spaces after the prompt.
pub fn format_prompt(message: impl Display, indent: usize) -> String {
    format!("{}{}{}", PROMPT, " ".repeat(indent), message)
}

/// Print a progress line (respects quiet mode).
pub fn prompt(message: impl Display, verbosity: Verbosity) {
    prompt_indented(message, 0, verbosity);
}

/// Print an indented progress line (respects quiet mode).
pub fn prompt_indented(message: impl Display, indent: usize, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", format_prompt(message, indent));
    }
}

/// Print a plain message, e.g. machine-readable output (always shown).
pub fn print(message: impl Display) {
    println!("{}", message);
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}
