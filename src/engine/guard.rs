//! engine::guard
//!
//! Ownership checks and the only filesystem writes of the engine.
//!
//! # Invariants
//!
//! - A file is overwritten or deleted only after its content was read and
//!   found to start with a recognized header
//! - A target without a recognized header fails with
//!   [`GenerateError::ManualCodeExists`] and is left untouched
//! - Directory scans are non-recursive and skip subdirectories

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use tracing::trace;

use super::errors::GenerateError;
use super::header::has_generated_header;

/// Load the generated code at `path`.
///
/// Returns `Ok(None)` if nothing exists at `path`, and
/// [`GenerateError::ManualCodeExists`] if the file was not generated.
pub fn load_generated_code(path: &Path) -> Result<Option<String>, GenerateError> {
    trace!(path = %path.display(), "stat target");

    if let Err(e) = fs::metadata(path) {
        if e.kind() == IoErrorKind::NotFound {
            return Ok(None);
        }
        return Err(GenerateError::io("can't stat", path, e));
    }

    let data = fs::read(path).map_err(|e| GenerateError::io("can't read", path, e))?;
    if !has_generated_header(&data) {
        return Err(GenerateError::ManualCodeExists {
            path: path.to_path_buf(),
        });
    }
    Ok(Some(String::from_utf8_lossy(&data).into_owned()))
}

/// Fail unless `path` is absent or owned by stackgen.
pub fn check_can_overwrite(path: &Path) -> Result<(), GenerateError> {
    load_generated_code(path).map(|_| ())
}

/// Write `code` to `path` after proving ownership of any existing file.
pub fn write_generated_code(path: &Path, code: &str) -> Result<(), GenerateError> {
    check_can_overwrite(path)?;

    trace!(path = %path.display(), "writing generated code");
    fs::write(path, code).map_err(|e| GenerateError::io("writing", path, e))
}

/// List generated files directly inside `dir`, sorted by name.
pub fn list_generated_files(dir: &Path) -> Result<Vec<String>, GenerateError> {
    let list_err = |e| GenerateError::io("listing stack files", dir, e);

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if entry.file_type().map_err(list_err)?.is_dir() {
            continue;
        }

        let path = entry.path();
        let data = fs::read(&path)
            .map_err(|e| GenerateError::io("checking if file is generated", &path, e))?;
        if has_generated_header(&data) {
            trace!(path = %path.display(), "generated file detected");
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}

/// Snapshot and remove every generated file directly inside `dir`.
///
/// Bodies of removed files are recorded in `removed` as they go, so a
/// failure midway still reports exactly what left the disk.
pub fn remove_generated_files(
    dir: &Path,
    removed: &mut BTreeMap<String, String>,
) -> Result<(), GenerateError> {
    for name in list_generated_files(dir)? {
        let path = dir.join(&name);

        let body = fs::read(&path)
            .map_err(|e| GenerateError::io("reading generated file before removal", &path, e))?;
        fs::remove_file(&path)
            .map_err(|e| GenerateError::io("removing generated file", &path, e))?;

        trace!(path = %path.display(), "removed generated file");
        removed.insert(name, String::from_utf8_lossy(&body).into_owned());
    }
    Ok(())
}
