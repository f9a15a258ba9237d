//! engine
//!
//! Code generation and drift detection over stacks.
//!
//! # Architecture
//!
//! The engine drives a per-stack pipeline:
//!
//! 1. **Resolve**: effective codegen config and globals via [`ConfigResolver`]
//! 2. **Render**: backend, locals and `generate_hcl` candidates ([`generators`])
//! 3. **Conflicts**: reject two sources targeting one filename ([`conflict`])
//! 4. **Write**: snapshot and remove owned files, then write non-empty
//!    candidates through the ownership guard ([`guard`])
//! 5. **Classify**: created, changed and deleted files ([`report`])
//!
//! Change detection runs steps 1 to 3 and diffs against disk.
//!
//! # Invariants
//!
//! - A file without a recognized [`header`] is never overwritten or deleted
//! - Failures are isolated to the stack they occur on
//! - The engine never prints; results are returned as data
//!
//! [`ConfigResolver`]: crate::core::config::ConfigResolver

pub mod conflict;
pub mod errors;
pub mod generators;
pub mod guard;
pub mod header;
pub mod report;
pub mod runner;

pub use errors::{ErrorKind, GenerateError, RenderError};
pub use generators::Genfile;
pub use report::{Report, StackReport};
pub use runner::{Engine, FsEngine};

use std::path::PathBuf;

/// Execution context derived from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Project root override.
    pub root: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Machine-readable output.
    pub json: bool,
}
