//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--root <path>`: Project root (defaults to the nearest git checkout)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stackgen - code generation and drift detection for infrastructure stacks
#[derive(Parser, Debug)]
#[command(name = "stackgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if stackgen was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Project root; defaults to the nearest ancestor containing .git
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate code for every stack under the working directory
    #[command(
        name = "generate",
        long_about = "Generate code for every stack under the working directory.\n\n\
            Renders the backend configuration, exported locals and generate_hcl \
            blocks of each stack. Files previously generated but no longer produced \
            are removed. Files without a stackgen header are never touched.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Generate code for the whole project
    stackgen generate

    # Only stacks below a directory
    stackgen --cwd stacks/prod generate

READING THE OUTPUT:
    [+] file    <- created
    [~] file    <- changed
    [-] file    <- deleted"
    )]
    Generate,

    /// List outdated generated files without changing anything
    #[command(
        name = "check",
        long_about = "List generated files that are out of date.\n\n\
            A file is outdated if regenerating would change it, create it, or \
            remove it. Exits with a non-zero status when anything is outdated, \
            which makes it suitable for CI.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Fail a CI job on drift
    stackgen check

    # Machine-readable drift report
    stackgen check --json"
    )]
    Check,

    /// List generated files of each stack
    #[command(name = "list")]
    List,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    stackgen completion bash > /etc/bash_completion.d/stackgen
    stackgen completion zsh > \"${fpath[1]}/_stackgen\""
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
