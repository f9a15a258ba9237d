//! engine::conflict
//!
//! Detection of generation sources targeting the same file.

use std::collections::HashSet;

use super::errors::GenerateError;
use super::generators::Genfile;

/// Fail on the first filename produced by more than one candidate.
///
/// Candidates with empty bodies still claim their filename.
pub fn check_conflicts(files: &[Genfile]) -> Result<(), GenerateError> {
    let mut seen = HashSet::with_capacity(files.len());
    for file in files {
        if !seen.insert(file.name.as_str()) {
            return Err(GenerateError::Conflict {
                filename: file.name.clone(),
            });
        }
    }
    Ok(())
}
