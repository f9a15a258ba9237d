//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the project root and working directory
//! 2. Calls the engine
//! 3. Formats and displays output
//!
//! Handlers never write generated files themselves; every filesystem change
//! goes through the engine's ownership guard.

mod check;
mod completion;
mod generate;
mod list;

pub use check::check;
pub use completion::completion;
pub use generate::generate;
pub use list::list;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::cli::args::Command;
use crate::engine::Context;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Generate => generate(ctx),
        Command::Check => check(ctx),
        Command::List => list(ctx),
        Command::Completion { shell } => completion(shell),
    }
}

/// Project root and working directory of an invocation, both canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub working_dir: PathBuf,
}

impl Project {
    /// Resolve the project from `--cwd` and `--root`.
    ///
    /// Without `--root`, the root is the nearest ancestor of the working
    /// directory containing `.git`, or the working directory itself.
    pub fn resolve(ctx: &Context) -> Result<Self> {
        let current = env::current_dir().context("failed to get current directory")?;

        let working_dir = canonical(&current, ctx.cwd.as_deref().unwrap_or(current.as_path()))?;
        let root = match &ctx.root {
            Some(root) => canonical(&current, root)?,
            None => find_root(&working_dir),
        };

        debug!(root = %root.display(), working_dir = %working_dir.display(), "resolved project");
        Ok(Self { root, working_dir })
    }
}

fn canonical(base: &Path, path: &Path) -> Result<PathBuf> {
    let path = base.join(path);
    fs::canonicalize(&path).with_context(|| format!("failed to resolve '{}'", path.display()))
}

/// Nearest ancestor of `dir` (inclusive) containing `.git`, else `dir`.
pub fn find_root(dir: &Path) -> PathBuf {
    dir.ancestors()
        .find(|d| d.join(".git").exists())
        .unwrap_or(dir)
        .to_path_buf()
}
