//! core
//!
//! Domain types consumed by the generation engine.
//!
//! # Modules
//!
//! - [`stack`] - Stack identity and metadata
//! - [`eval`] - Expressions and the evaluator capability
//! - [`hcl`] - HCL bodies and deterministic rendering
//! - [`config`] - Configuration contracts and the `stackgen.toml` loader
//!
//! # Design Principles
//!
//! - Rendering is deterministic: identical input yields identical bytes
//! - Configuration is strict; unknown keys are rejected

pub mod config;
pub mod eval;
pub mod hcl;
pub mod stack;
