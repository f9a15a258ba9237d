//! core::stack
//!
//! Stack identity and metadata.
//!
//! A stack is identified by its absolute directory. Its metadata is exposed
//! to expressions as the `stack` namespace:
//!
//! - `stack.name` - declared name, or the directory basename
//! - `stack.description` - declared description, or `""`
//! - `stack.path` - project-relative path with a leading `/`

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::eval::Namespace;

/// Metadata describing a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackMetadata {
    /// Stack name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Path relative to the project root, always starting with `/`.
    pub path: String,
}

impl StackMetadata {
    /// Convert the metadata into an evaluation namespace.
    pub fn to_namespace(&self) -> Namespace {
        let mut ns = Namespace::new();
        ns.insert("name".into(), self.name.clone().into());
        ns.insert("description".into(), self.description.clone().into());
        ns.insert("path".into(), self.path.clone().into());
        ns
    }
}

/// An independently generated configuration unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    abs_path: PathBuf,
    meta: StackMetadata,
}

impl Stack {
    /// Create a stack rooted at `abs_path` inside the project `root`.
    ///
    /// `name` defaults to the directory basename when not declared.
    pub fn new(
        root: &Path,
        abs_path: impl Into<PathBuf>,
        name: Option<String>,
        description: Option<String>,
    ) -> Self {
        let abs_path = abs_path.into();
        let name = name.unwrap_or_else(|| {
            abs_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Self {
            meta: StackMetadata {
                name,
                description: description.unwrap_or_default(),
                path: project_path(root, &abs_path),
            },
            abs_path,
        }
    }

    /// Absolute directory of the stack.
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Stack metadata.
    pub fn meta(&self) -> &StackMetadata {
        &self.meta
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meta.path)
    }
}

/// Render `abs` as a project path (`/` for the root itself).
///
/// Paths outside of `root` are rendered as-is.
pub fn project_path(root: &Path, abs: &Path) -> String {
    match abs.strip_prefix(root) {
        Ok(rel) => {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("/{}", parts.join("/"))
        }
        Err(_) => abs.to_string_lossy().into_owned(),
    }
}
