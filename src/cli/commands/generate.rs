//! generate command - Generate code for every stack under the working directory

use anyhow::{bail, Result};

use super::Project;
use crate::engine::{Context, FsEngine};
use crate::ui::output::{self, Verbosity};

/// Generate code and print the report.
///
/// Fails if the run failed as a whole or on any stack.
pub fn generate(ctx: &Context) -> Result<()> {
    let project = Project::resolve(ctx)?;
    let report = FsEngine::default().generate(&project.root, &project.working_dir);

    if ctx.json {
        output::print_json(&output::report_json(&report))?;
    } else if report.has_failures() {
        // Failures are shown even in quiet mode.
        print!("{report}");
    } else {
        output::print(report.to_string().trim_end(), Verbosity::from_flags(ctx.quiet, ctx.debug));
    }

    if report.has_failures() {
        bail!("code generation failed");
    }
    Ok(())
}
