//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, output is machine-readable JSON on stdout.

use std::collections::BTreeMap;
use std::fmt::Display;

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::engine::{Report, StackReport};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
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

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Join a stack's project path and a filename.
pub fn stack_file(stack_path: &str, name: &str) -> String {
    format!("{}/{}", stack_path.trim_end_matches('/'), name)
}

/// Machine-readable form of a generation report.
pub fn report_json(report: &Report) -> serde_json::Value {
    let stacks: BTreeMap<&str, serde_json::Value> = report
        .stacks
        .iter()
        .map(|(path, stack)| (path.as_str(), stack_json(stack)))
        .collect();

    json!({
        "bootstrap_error": report.bootstrap_err.as_ref().map(|e| e.to_string()),
        "stacks": stacks,
    })
}

fn stack_json(stack: &StackReport) -> serde_json::Value {
    json!({
        "created": stack.created,
        "changed": stack.changed,
        "deleted": stack.deleted,
        "error": stack.error.as_ref().map(|e| e.to_string()),
    })
}
