//! engine::header
//!
//! Ownership headers of generated files.
//!
//! A file is owned by stackgen iff its content starts with one of
//! [`RECOGNIZED_HEADERS`]. The current header is written on every
//! generation; older headers stay recognized so files produced by previous
//! versions can still be updated or removed.

/// Header written at the top of every generated file.
pub const HEADER: &str = "// STACKGEN: GENERATED AUTOMATICALLY DO NOT EDIT";

/// First header format, still recognized as an ownership proof.
pub const HEADER_V0: &str = "// GENERATED BY STACKGEN: DO NOT EDIT";

/// Every header accepted as proof of ownership, newest first.
pub const RECOGNIZED_HEADERS: &[&str] = &[HEADER, HEADER_V0];

/// Check whether `code` starts with a recognized header.
pub fn has_generated_header(code: &[u8]) -> bool {
    RECOGNIZED_HEADERS
        .iter()
        .any(|header| code.starts_with(header.as_bytes()))
}

/// Prefix generated code with the current header.
pub fn prepend_header(code: &str) -> String {
    format!("{HEADER}\n\n{code}")
}

/// Prefix generated HCL with the header and the block it originated from.
pub fn prepend_origin_header(origin: &str, code: &str) -> String {
    format!("{HEADER}\n// STACKGEN: originated from generate_hcl block on {origin}\n\n{code}")
}
