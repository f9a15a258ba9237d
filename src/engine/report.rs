//! engine::report
//!
//! Outcome of a code generation run.
//!
//! # Outcomes
//!
//! Consumers must tell apart:
//!
//! - **Bootstrap failure**: [`Report::bootstrap_err`] is set and no stack
//!   was processed
//! - **Stack failure**: the stack entry carries an error; its name sets
//!   still reflect what changed on disk before the failure
//! - **Up to date**: no error and empty name sets
//!
//! # Invariants
//!
//! - If `bootstrap_err` is set, `stacks` is empty
//! - Name sets are sorted

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::errors::GenerateError;

/// Per-stack outcome of a generation run.
#[derive(Debug, Default)]
pub struct StackReport {
    pub created: BTreeSet<String>,
    pub changed: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub error: Option<GenerateError>,
}

impl StackReport {
    /// Whether the run touched no file of this stack.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }

    fn fmt_files(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.created {
            writeln!(f, "\t[+] {name}")?;
        }
        for name in &self.changed {
            writeln!(f, "\t[~] {name}")?;
        }
        for name in &self.deleted {
            writeln!(f, "\t[-] {name}")?;
        }
        Ok(())
    }
}

/// Aggregated outcome of a generation run.
#[derive(Debug, Default)]
pub struct Report {
    /// Failure that prevented any stack from being processed.
    pub bootstrap_err: Option<GenerateError>,
    /// Per-stack outcomes keyed by project path.
    pub stacks: BTreeMap<String, StackReport>,
}

impl Report {
    pub(crate) fn bootstrap(err: GenerateError) -> Self {
        Self {
            bootstrap_err: Some(err),
            stacks: BTreeMap::new(),
        }
    }

    /// Whether the run failed as a whole or on any stack.
    pub fn has_failures(&self) -> bool {
        self.bootstrap_err.is_some() || self.stacks.values().any(|s| s.error.is_some())
    }

    /// Stacks that failed, sorted by path.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &StackReport)> {
        self.stacks
            .iter()
            .filter(|(_, s)| s.error.is_some())
            .map(|(path, s)| (path.as_str(), s))
    }

    /// Stacks processed without error, sorted by path.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &StackReport)> {
        self.stacks
            .iter()
            .filter(|(_, s)| s.error.is_none())
            .map(|(path, s)| (path.as_str(), s))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = &self.bootstrap_err {
            return writeln!(f, "Fatal failure while bootstrapping: {err}");
        }

        let changed: Vec<_> = self.successes().filter(|(_, s)| !s.is_empty()).collect();
        let failed: Vec<_> = self.failures().collect();

        if changed.is_empty() && failed.is_empty() {
            return writeln!(f, "Nothing to do, generated code is up to date");
        }

        writeln!(f, "Code generation report")?;

        if !changed.is_empty() {
            writeln!(f)?;
            writeln!(f, "Successes:")?;
            for (path, stack) in changed {
                writeln!(f)?;
                writeln!(f, "- {path}")?;
                stack.fmt_files(f)?;
            }
        }

        if !failed.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures:")?;
            for (path, stack) in failed {
                writeln!(f)?;
                writeln!(f, "- {path}")?;
                if let Some(err) = &stack.error {
                    writeln!(f, "\terror: {err}")?;
                }
                stack.fmt_files(f)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_report_is_up_to_date() {
        let mut report = Report::default();
        report
            .stacks
            .insert("/stacks/a".into(), StackReport::default());

        assert!(!report.has_failures());
        assert_eq!(
            report.to_string(),
            "Nothing to do, generated code is up to date\n"
        );
    }

    #[test]
    fn bootstrap_failure_has_no_stacks() {
        let report = Report::bootstrap(GenerateError::RelativePath {
            name: "root",
            path: "prj".into(),
        });
        assert!(report.has_failures());
        assert!(report.stacks.is_empty());
        assert!(report
            .to_string()
            .starts_with("Fatal failure while bootstrapping:"));
    }

    #[test]
    fn display_lists_successes_then_failures() {
        let mut report = Report::default();
        report.stacks.insert(
            "/b".into(),
            StackReport {
                deleted: names(&["old.tf"]),
                error: Some(GenerateError::Conflict {
                    filename: "x.tf".into(),
                }),
                ..Default::default()
            },
        );
        report.stacks.insert(
            "/a".into(),
            StackReport {
                created: names(&["new.tf"]),
                changed: names(&["main.tf"]),
                ..Default::default()
            },
        );

        let want = "Code generation report\n\
                    \n\
                    Successes:\n\
                    \n\
                    - /a\n\
                    \t[+] new.tf\n\
                    \t[~] main.tf\n\
                    \n\
                    Failures:\n\
                    \n\
                    - /b\n\
                    \terror: conflicting config detected: two configurations produce same file 'x.tf'\n\
                    \t[-] old.tf\n";
        assert_eq!(report.to_string(), want);
        assert!(report.has_failures());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.successes().count(), 1);
    }
}
