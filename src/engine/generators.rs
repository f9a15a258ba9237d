//! engine::generators
//!
//! Candidate artifact generators.
//!
//! # Generators
//!
//! - [`generate_backend_cfg`] - `terraform { backend ... }` from the nearest
//!   ancestor declaring a backend
//! - [`generate_locals`] - a `locals` block from exported locals
//! - [`generate_hcl`] - one artifact per `generate_hcl` declaration
//!
//! Each generator evaluates against its own evaluator carrying the `stack`
//! and `global` namespaces. An empty body means "no file".
//!
//! # Invariants
//!
//! - Output is deterministic for identical configuration
//! - Any evaluation failure fails the whole artifact; no partial body is
//!   ever produced

use std::path::Path;

use tracing::trace;

use super::errors::{GenerateError, RenderError};
use super::header::{prepend_header, prepend_origin_header};
use crate::core::config::{CodegenConfig, ConfigResolver, Globals};
use crate::core::eval::{EvalError, Evaluator};
use crate::core::hcl::{render_body, HclWriter};
use crate::core::stack::Stack;

/// A candidate artifact: a file a stack should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genfile {
    /// Filename relative to the stack directory.
    pub name: String,
    /// Rendered content; empty means the file must not exist.
    pub body: String,
}

/// Create an evaluator with the `stack` and `global` namespaces.
pub fn stack_evaluator<E: Evaluator + Default>(
    stack: &Stack,
    globals: &Globals,
) -> Result<E, EvalError> {
    let mut ev = E::default();
    ev.set_namespace("stack", stack.meta().to_namespace())?;
    ev.set_namespace("global", globals.attributes().clone())?;
    Ok(ev)
}

/// Render the backend configuration of `stack`.
///
/// Searches from the stack directory upwards for a directory declaring a
/// backend, stopping at the project root boundary.
pub fn generate_backend_cfg<R, E>(
    resolver: &R,
    root: &Path,
    stack: &Stack,
    globals: &Globals,
) -> Result<String, RenderError>
where
    R: ConfigResolver + ?Sized,
    E: Evaluator + Default,
{
    let mut dir = stack.abs_path();
    loop {
        if !dir.starts_with(root) {
            trace!(dir = %dir.display(), "left project root, no backend found");
            return Ok(String::new());
        }

        if let Some(backend) = resolver.backend(dir)? {
            trace!(dir = %dir.display(), "found backend declaration");

            let ev: E = stack_evaluator(stack, globals)?;
            let mut w = HclWriter::new();
            w.open_block("terraform", &[]);
            w.open_block("backend", &backend.labels);
            w.write_body(&backend.body, &ev)?;
            w.close_block();
            w.close_block();
            return Ok(prepend_header(&w.finish()));
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Ok(String::new()),
        }
    }
}

/// Render the exported locals of `stack`.
pub fn generate_locals<R, E>(
    resolver: &R,
    root: &Path,
    stack: &Stack,
    globals: &Globals,
) -> Result<String, RenderError>
where
    R: ConfigResolver + ?Sized,
    E: Evaluator + Default,
{
    let locals = resolver.exported_locals(root, stack)?;
    if locals.is_empty() {
        return Ok(String::new());
    }

    // The resolved map is unordered; sorting keeps the output stable.
    let mut names: Vec<&String> = locals.keys().collect();
    names.sort();

    let ev: E = stack_evaluator(stack, globals)?;
    let mut w = HclWriter::new();
    w.open_block("locals", &[]);
    for name in names {
        let value = ev.eval(&locals[name])?;
        w.attribute(name, value);
    }
    w.close_block();

    Ok(prepend_header(&w.finish()))
}

/// Render every `generate_hcl` declaration applying to `stack`.
pub fn generate_hcl<R, E>(
    resolver: &R,
    root: &Path,
    stack: &Stack,
    globals: &Globals,
) -> Result<Vec<Genfile>, RenderError>
where
    R: ConfigResolver + ?Sized,
    E: Evaluator + Default,
{
    let blocks = resolver.generate_hcl(root, stack)?;
    let ev: E = stack_evaluator(stack, globals)?;

    let mut files = Vec::with_capacity(blocks.len());
    for block in blocks {
        let code = render_body(&block.body, &ev)?;
        let body = if code.is_empty() {
            code
        } else {
            prepend_origin_header(&block.origin, &code)
        };
        trace!(filename = %block.name, empty = body.is_empty(), "rendered generate_hcl");
        files.push(Genfile {
            name: block.name,
            body,
        });
    }
    Ok(files)
}

/// Build the full candidate set of `stack`.
pub fn stack_genfiles<R, E>(
    resolver: &R,
    root: &Path,
    stack: &Stack,
    cfg: &CodegenConfig,
    globals: &Globals,
) -> Result<Vec<Genfile>, GenerateError>
where
    R: ConfigResolver + ?Sized,
    E: Evaluator + Default,
{
    trace!("generating backend config");
    let backend = generate_backend_cfg::<R, E>(resolver, root, stack, globals)
        .map_err(GenerateError::BackendConfigGen)?;

    trace!("generating locals");
    let locals = generate_locals::<R, E>(resolver, root, stack, globals)
        .map_err(GenerateError::ExportingLocalsGen)?;

    trace!("generating hcl");
    let hcl = generate_hcl::<R, E>(resolver, root, stack, globals)
        .map_err(GenerateError::GenerateHcl)?;

    let mut files = vec![
        Genfile {
            name: cfg.backend_cfg_filename.clone(),
            body: backend,
        },
        Genfile {
            name: cfg.locals_filename.clone(),
            body: locals,
        },
    ];
    files.extend(hcl);
    Ok(files)
}
