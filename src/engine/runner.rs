//! engine::runner
//!
//! The generation engine: the per-stack pipeline and change detection.
//!
//! # Pipeline
//!
//! ```text
//! Resolve -> Render -> Conflicts -> Snapshot+Remove -> Write -> Classify
//! ```
//!
//! [`Engine::check_stack`] runs `Resolve -> Render -> Conflicts` and then
//! diffs against disk without touching it.
//!
//! # Invariants
//!
//! - Conflicts are detected before any destructive operation on a stack
//! - Only files carrying a recognized header are removed or overwritten
//! - A failing stack never stops the run; its report reflects what
//!   actually changed on disk before the failure
//! - Stacks are processed sequentially in discovery order
//!
//! # Example
//!
//! ```ignore
//! use stackgen::engine::FsEngine;
//!
//! let engine = FsEngine::default();
//! let report = engine.generate(&root, &working_dir);
//! if report.has_failures() {
//!     eprintln!("{report}");
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::path::{Component, Path};

use tracing::{debug, debug_span, info_span, trace, warn};

use super::conflict::check_conflicts;
use super::errors::GenerateError;
use super::generators::{stack_genfiles, Genfile};
use super::guard;
use super::report::{Report, StackReport};
use crate::core::config::{ConfigResolver, FsResolver, StackLister};
use crate::core::eval::{Evaluator, TemplateEvaluator};
use crate::core::stack::Stack;

/// Code generation engine.
///
/// `R` resolves configuration, `L` discovers stacks and `E` is the
/// evaluator instantiated for every generated artifact.
#[derive(Debug)]
pub struct Engine<R, L, E = TemplateEvaluator> {
    resolver: R,
    lister: L,
    evaluator: PhantomData<fn() -> E>,
}

/// Engine over `stackgen.toml` files.
pub type FsEngine = Engine<FsResolver, FsResolver>;

impl Default for FsEngine {
    fn default() -> Self {
        Self::new(FsResolver, FsResolver)
    }
}

impl<R, L, E> Engine<R, L, E>
where
    R: ConfigResolver,
    L: StackLister,
    E: Evaluator + Default,
{
    pub fn new(resolver: R, lister: L) -> Self {
        Self {
            resolver,
            lister,
            evaluator: PhantomData,
        }
    }

    /// Stacks at or under `working_dir`, in discovery order.
    ///
    /// Both paths must be absolute and `working_dir` must be `root` or one
    /// of its descendants.
    pub fn stacks(&self, root: &Path, working_dir: &Path) -> Result<Vec<Stack>, GenerateError> {
        validate_dirs(root, working_dir)?;

        let stacks = self
            .lister
            .list_stacks(root)
            .map_err(GenerateError::ListStacks)?;

        Ok(stacks
            .into_iter()
            .filter(|s| s.abs_path().starts_with(working_dir))
            .collect())
    }

    /// Generate code for every stack at or under `working_dir`.
    pub fn generate(&self, root: &Path, working_dir: &Path) -> Report {
        let span = info_span!(
            "generate",
            root = %root.display(),
            working_dir = %working_dir.display()
        );
        let _enter = span.enter();

        let stacks = match self.stacks(root, working_dir) {
            Ok(stacks) => stacks,
            Err(err) => {
                warn!(error = %err, "bootstrap failed");
                return Report::bootstrap(err);
            }
        };
        debug!(count = stacks.len(), "stacks selected");

        let mut report = Report::default();
        for stack in &stacks {
            let span = debug_span!("stack", stack = %stack);
            let _enter = span.enter();

            let outcome = self.generate_stack(root, stack);
            if let Some(err) = &outcome.error {
                warn!(error = %err, "stack failed");
            }
            report.stacks.insert(stack.meta().path.clone(), outcome);
        }
        report
    }

    fn generate_stack(&self, root: &Path, stack: &Stack) -> StackReport {
        let mut report = StackReport::default();

        let files = match self.candidates(root, stack) {
            Ok(files) => files,
            Err(err) => {
                report.error = Some(err);
                return report;
            }
        };

        trace!("removing old generated files");
        let mut removed = BTreeMap::new();
        if let Err(err) = guard::remove_generated_files(stack.abs_path(), &mut removed) {
            return failed(
                report,
                removed,
                GenerateError::RemovingOldFiles(Box::new(err)),
            );
        }

        for file in files {
            if file.body.is_empty() {
                trace!(filename = %file.name, "empty body, not writing");
                continue;
            }

            let path = stack.abs_path().join(&file.name);
            if let Err(err) = guard::write_generated_code(&path, &file.body) {
                return failed(
                    report,
                    removed,
                    GenerateError::SavingFile {
                        filename: file.name,
                        source: Box::new(err),
                    },
                );
            }

            match removed.remove(&file.name) {
                None => {
                    report.created.insert(file.name);
                }
                Some(old) if old != file.body => {
                    report.changed.insert(file.name);
                }
                Some(_) => {}
            }
            trace!(path = %path.display(), "saved generated file");
        }

        report.deleted.extend(removed.into_keys());
        report
    }

    /// Outdated generated files of `stack`, sorted.
    ///
    /// A file is outdated when its body differs from what the current
    /// configuration renders, when it would be newly created, or when no
    /// configuration produces it anymore. Never touches the filesystem.
    pub fn check_stack(&self, root: &Path, stack: &Stack) -> Result<Vec<String>, GenerateError> {
        let span = debug_span!("check_stack", stack = %stack);
        let _enter = span.enter();

        let files = self.candidates(root, stack)?;

        trace!("listing current generated files");
        let mut current: BTreeSet<String> = guard::list_generated_files(stack.abs_path())?
            .into_iter()
            .collect();

        let mut outdated = BTreeSet::new();
        for file in files {
            let path = stack.abs_path().join(&file.name);
            match guard::load_generated_code(&path)? {
                None if file.body.is_empty() => {}
                None => {
                    outdated.insert(file.name);
                }
                Some(code) => {
                    current.remove(&file.name);
                    if code != file.body {
                        outdated.insert(file.name);
                    }
                }
            }
        }

        // Generated files nothing renders anymore.
        outdated.extend(current);
        Ok(outdated.into_iter().collect())
    }

    /// Generated files currently present in `stack`, sorted.
    pub fn list_generated_files(&self, stack: &Stack) -> Result<Vec<String>, GenerateError> {
        guard::list_generated_files(stack.abs_path())
    }

    fn candidates(&self, root: &Path, stack: &Stack) -> Result<Vec<Genfile>, GenerateError> {
        trace!("loading stack code gen config");
        let cfg = self
            .resolver
            .codegen_config(root, stack)
            .map_err(GenerateError::LoadingStackCfg)?;

        trace!("loading globals");
        let globals = self
            .resolver
            .globals(root, stack)
            .map_err(GenerateError::LoadingGlobals)?;

        let files = stack_genfiles::<R, E>(&self.resolver, root, stack, &cfg, &globals)?;
        check_conflicts(&files)?;
        Ok(files)
    }
}

/// Finish a failed stack; files already removed are reported as deleted.
fn failed(
    mut report: StackReport,
    removed: BTreeMap<String, String>,
    err: GenerateError,
) -> StackReport {
    report.deleted.extend(removed.into_keys());
    report.error = Some(err);
    report
}

fn validate_dirs(root: &Path, working_dir: &Path) -> Result<(), GenerateError> {
    for (name, path) in [("root", root), ("working dir", working_dir)] {
        if !path.is_absolute() {
            return Err(GenerateError::RelativePath {
                name,
                path: path.to_path_buf(),
            });
        }
        // Containment below is lexical.
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(GenerateError::NotNormalized {
                name,
                path: path.to_path_buf(),
            });
        }
    }
    if !working_dir.starts_with(root) {
        return Err(GenerateError::WorkingDirOutsideRoot {
            root: root.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
        });
    }
    Ok(())
}
