//! list command - List generated files of each stack

use std::collections::BTreeMap;

use anyhow::Result;

use super::Project;
use crate::engine::{Context, FsEngine};
use crate::ui::output::{self, Verbosity};

/// Print the generated files currently present in each stack.
pub fn list(ctx: &Context) -> Result<()> {
    let project = Project::resolve(ctx)?;
    let engine = FsEngine::default();

    let mut files: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for stack in engine.stacks(&project.root, &project.working_dir)? {
        files.insert(stack.meta().path.clone(), engine.list_generated_files(&stack)?);
    }

    if ctx.json {
        return output::print_json(&files);
    }

    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    for (stack, names) in &files {
        for name in names {
            output::print(output::stack_file(stack, name), verbosity);
        }
    }
    Ok(())
}
