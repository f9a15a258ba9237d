//! engine::errors
//!
//! Error taxonomy of the generation engine.
//!
//! Every [`GenerateError`] maps to one [`ErrorKind`]:
//!
//! - **Bootstrap**: stack enumeration failed, nothing was processed
//! - **StackConfig**: resolving or evaluating one stack's config failed
//! - **Conflict**: two sources target the same filename in one stack
//! - **ManualCodeExists**: a target exists without a recognized header
//! - **Io**: stat/read/write/remove failures
//!
//! Errors other than bootstrap errors are isolated to the stack they
//! occurred on.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ResolveError;
use crate::core::eval::EvalError;

/// Classification of a [`GenerateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Bootstrap,
    StackConfig,
    Conflict,
    ManualCodeExists,
    Io,
}

/// Failure to render a candidate artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Errors from code generation and change detection.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A path argument was not absolute.
    #[error("{name} must be an absolute path, got '{}'", path.display())]
    RelativePath { name: &'static str, path: PathBuf },

    /// A path argument contains `..` components.
    #[error("{name} must not contain '..' components, got '{}'", path.display())]
    NotNormalized { name: &'static str, path: PathBuf },

    /// The working dir is neither the root nor below it.
    #[error(
        "working dir '{}' is not inside project root '{}'",
        working_dir.display(),
        root.display()
    )]
    WorkingDirOutsideRoot { root: PathBuf, working_dir: PathBuf },

    /// Stack discovery failed.
    #[error("listing stacks: {0}")]
    ListStacks(#[source] ResolveError),

    #[error("loading stack code gen config: {0}")]
    LoadingStackCfg(#[source] ResolveError),

    #[error("loading globals: {0}")]
    LoadingGlobals(#[source] ResolveError),

    #[error("generating backend config: {0}")]
    BackendConfigGen(#[source] RenderError),

    #[error("generating locals: {0}")]
    ExportingLocalsGen(#[source] RenderError),

    #[error("generating hcl: {0}")]
    GenerateHcl(#[source] RenderError),

    /// Two generation sources produce the same file.
    #[error("conflicting config detected: two configurations produce same file '{filename}'")]
    Conflict { filename: String },

    /// The target exists but was not generated by stackgen.
    #[error("manually defined code found at '{}'", path.display())]
    ManualCodeExists { path: PathBuf },

    #[error("{op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("removing old generated files: {0}")]
    RemovingOldFiles(#[source] Box<GenerateError>),

    #[error("saving file '{filename}': {source}")]
    SavingFile {
        filename: String,
        source: Box<GenerateError>,
    },
}

impl GenerateError {
    /// Classify the error, looking through wrapping variants.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::RelativePath { .. }
            | GenerateError::NotNormalized { .. }
            | GenerateError::WorkingDirOutsideRoot { .. }
            | GenerateError::ListStacks(_) => ErrorKind::Bootstrap,
            GenerateError::LoadingStackCfg(_)
            | GenerateError::LoadingGlobals(_)
            | GenerateError::BackendConfigGen(_)
            | GenerateError::ExportingLocalsGen(_)
            | GenerateError::GenerateHcl(_) => ErrorKind::StackConfig,
            GenerateError::Conflict { .. } => ErrorKind::Conflict,
            GenerateError::ManualCodeExists { .. } => ErrorKind::ManualCodeExists,
            GenerateError::Io { .. } => ErrorKind::Io,
            GenerateError::RemovingOldFiles(inner) => inner.kind(),
            GenerateError::SavingFile { source, .. } => source.kind(),
        }
    }

    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_sees_through_wrappers() {
        let err = GenerateError::SavingFile {
            filename: "main.tf".into(),
            source: Box::new(GenerateError::ManualCodeExists {
                path: "/prj/stack/main.tf".into(),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::ManualCodeExists);
        assert!(err.to_string().contains("main.tf"));
        assert!(err.to_string().contains("manually defined code"));

        let err = GenerateError::RemovingOldFiles(Box::new(GenerateError::io(
            "removing",
            "/prj/x.tf",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        )));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn config_errors_are_stack_config() {
        let err = GenerateError::GenerateHcl(RenderError::Eval(EvalError::Undefined {
            expr: "stack.nope".into(),
        }));
        assert_eq!(err.kind(), ErrorKind::StackConfig);
        assert!(err.to_string().starts_with("generating hcl:"));
    }
}
