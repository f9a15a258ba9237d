//! Stackgen - code generation and drift detection for infrastructure stacks
//!
//! Stackgen renders Terraform/HCL files into every stack of a project from
//! layered `stackgen.toml` configuration: backend configuration, exported
//! locals and arbitrary `generate_hcl` blocks. It can also report which
//! generated files are out of date without touching anything.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Per-stack generation pipeline and change detection
//! - [`core`] - Stacks, expressions, HCL rendering and configuration
//! - [`ui`] - Output utilities
//!
//! # Correctness Invariants
//!
//! 1. Files lacking a recognized header are never overwritten or deleted
//! 2. Generation is idempotent and deterministic
//! 3. A failure in one stack never aborts the others

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
