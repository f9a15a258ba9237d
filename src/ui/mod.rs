//! ui
//!
//! User-facing output utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All console output goes through this module so quiet and JSON modes
//! are handled in one place. The engine itself never prints.

pub mod output;
