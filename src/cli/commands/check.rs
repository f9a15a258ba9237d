//! check command - List outdated generated files

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde_json::json;

use super::Project;
use crate::engine::{Context, FsEngine};
use crate::ui::output::{self, Verbosity};

/// Print outdated generated files of every stack under the working dir.
///
/// A stack that cannot be checked is reported and the remaining stacks are
/// still checked. Fails when anything is outdated or failed.
pub fn check(ctx: &Context) -> Result<()> {
    let project = Project::resolve(ctx)?;
    let engine = FsEngine::default();
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    let mut outdated: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut errors: BTreeMap<String, String> = BTreeMap::new();
    for stack in engine.stacks(&project.root, &project.working_dir)? {
        let path = stack.meta().path.clone();
        match engine.check_stack(&project.root, &stack) {
            Ok(files) if files.is_empty() => {}
            Ok(files) => {
                outdated.insert(path, files);
            }
            Err(err) => {
                errors.insert(path, format!("{:#}", anyhow::Error::new(err)));
            }
        }
    }

    if ctx.json {
        output::print_json(&json!({ "outdated": outdated, "errors": errors }))?;
    } else {
        for (stack, files) in &outdated {
            for name in files {
                output::print(output::stack_file(stack, name), verbosity);
            }
        }
        for (stack, message) in &errors {
            output::error(format!("checking stack '{stack}': {message}"));
        }
    }

    match (errors.len(), outdated.is_empty()) {
        (0, true) => Ok(()),
        (0, false) => bail!("outdated generated code detected, run 'stackgen generate'"),
        (n, _) => bail!("{n} stack(s) could not be checked"),
    }
}
