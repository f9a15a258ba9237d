//! core::config
//!
//! Configuration contracts consumed by the generation engine.
//!
//! # Overview
//!
//! The engine never parses configuration itself. It talks to two
//! collaborators:
//!
//! - [`ConfigResolver`] - effective (merged) configuration for a stack,
//!   plus the per-directory backend lookup used by the upward search
//! - [`StackLister`] - stack discovery under the project root
//!
//! [`FsResolver`] implements both on top of per-directory
//! `stackgen.toml` files (see [`schema`]).
//!
//! # Precedence
//!
//! Configuration is collected from the project root down to the stack
//! directory; declarations nearer the stack override those above it.
//! Backend declarations are the exception: they are looked up one
//! directory at a time by the backend generator.

pub mod loader;
pub mod schema;

pub use loader::FsResolver;
pub use schema::DirConfig;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::eval::{EvalError, Expr, Namespace};
use super::hcl::Body;
use super::stack::Stack;

/// Name of the per-directory configuration file.
pub const CONFIG_FILENAME: &str = "stackgen.toml";

/// Default filename of the generated backend configuration.
pub const DEFAULT_BACKEND_CFG_FILENAME: &str = "_stackgen_backend.tf";

/// Default filename of the generated locals.
pub const DEFAULT_LOCALS_FILENAME: &str = "_stackgen_locals.tf";

/// Errors from resolving configuration.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config in '{path}': {message}")]
    InvalidValue { path: PathBuf, message: String },

    #[error("evaluating global '{name}': {source}")]
    Global { name: String, source: EvalError },

    #[error("failed to list directory '{path}': {source}")]
    ListError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Code generation settings of a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenConfig {
    pub backend_cfg_filename: String,
    pub locals_filename: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            backend_cfg_filename: DEFAULT_BACKEND_CFG_FILENAME.to_string(),
            locals_filename: DEFAULT_LOCALS_FILENAME.to_string(),
        }
    }
}

/// Evaluated global values of a stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Globals {
    attrs: Namespace,
}

impl Globals {
    pub fn new(attrs: Namespace) -> Self {
        Self { attrs }
    }

    /// Global values, exposed to expressions as the `global` namespace.
    pub fn attributes(&self) -> &Namespace {
        &self.attrs
    }
}

/// A backend declaration found in one directory.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendBlock {
    pub labels: Vec<String>,
    pub body: Body,
}

/// A `generate_hcl` declaration that applies to a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct GenHclBlock {
    /// Target filename inside the stack.
    pub name: String,
    /// Project path of the file declaring the block.
    pub origin: String,
    /// Unevaluated contents.
    pub body: Body,
}

/// Effective configuration of stacks.
pub trait ConfigResolver {
    /// Code generation settings for `stack`.
    fn codegen_config(&self, root: &Path, stack: &Stack) -> Result<CodegenConfig, ResolveError>;

    /// Evaluated globals for `stack`.
    fn globals(&self, root: &Path, stack: &Stack) -> Result<Globals, ResolveError>;

    /// Backend declared directly in `dir`.
    ///
    /// `Ok(None)` means no backend is declared there, which is not an error.
    fn backend(&self, dir: &Path) -> Result<Option<BackendBlock>, ResolveError>;

    /// Unevaluated exported locals for `stack`. Iteration order is undefined.
    fn exported_locals(
        &self,
        root: &Path,
        stack: &Stack,
    ) -> Result<HashMap<String, Expr>, ResolveError>;

    /// `generate_hcl` declarations applying to `stack`.
    fn generate_hcl(&self, root: &Path, stack: &Stack) -> Result<Vec<GenHclBlock>, ResolveError>;
}

/// Stack discovery.
pub trait StackLister {
    /// Every stack under `root`, in discovery order.
    fn list_stacks(&self, root: &Path) -> Result<Vec<Stack>, ResolveError>;
}
