//! core::config::schema
//!
//! Schema of a directory's `stackgen.toml`.
//!
//! # Example
//!
//! ```toml
//! [stack]
//! name = "app"
//! description = "application tier"
//!
//! [config.generate]
//! backend_config_filename = "backend.tf"
//! locals_filename = "locals.tf"
//!
//! [backend]
//! labels = ["gcs"]
//!
//! [backend.attributes]
//! bucket = "${global.bucket}"
//! prefix = "states${stack.path}"
//!
//! [globals]
//! bucket = "acme-states"
//!
//! [export_as_locals]
//! stack_name = "${stack.name}"
//!
//! [[generate_hcl]]
//! name = "versions.tf"
//!
//! [[generate_hcl.blocks]]
//! type = "terraform"
//!
//! [generate_hcl.blocks.attributes]
//! required_version = "1.10"
//! ```
//!
//! # Validation
//!
//! Generated filenames must be plain names: not empty, not `.` or `..`,
//! and without path separators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::eval::{Expr, Value};
use crate::core::hcl::{Attribute, Block, Body};

/// Everything one directory declares.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DirConfig {
    /// Marks the directory as a stack.
    pub stack: Option<StackDecl>,

    /// Code generation settings.
    pub config: Option<ConfigDecl>,

    /// Backend declaration, used by the nearest stack below.
    pub backend: Option<BackendDecl>,

    /// Global values, inherited by every stack below.
    pub globals: toml::Table,

    /// Values exported as Terraform locals.
    pub export_as_locals: toml::Table,

    /// Generated HCL files.
    pub generate_hcl: Vec<GenerateHclDecl>,
}

/// `[stack]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StackDecl {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `[config]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigDecl {
    pub generate: Option<GenerateDecl>,
}

/// `[config.generate]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateDecl {
    /// Filename of the generated backend configuration.
    pub backend_config_filename: Option<String>,

    /// Filename of the generated locals.
    pub locals_filename: Option<String>,
}

impl GenerateDecl {
    /// Validate the configured filenames.
    pub fn validate(&self) -> Result<(), String> {
        for name in [&self.backend_config_filename, &self.locals_filename]
            .into_iter()
            .flatten()
        {
            validate_filename(name)?;
        }
        Ok(())
    }
}

/// `[backend]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BackendDecl {
    pub labels: Vec<String>,
    pub attributes: toml::Table,
    pub blocks: Vec<BlockDecl>,
}

impl BackendDecl {
    pub fn body(&self) -> Result<Body, String> {
        body_from_decl(&self.attributes, &self.blocks)
    }
}

/// A nested block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BlockDecl {
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: Vec<String>,
    pub attributes: toml::Table,
    pub blocks: Vec<BlockDecl>,
}

/// `[[generate_hcl]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateHclDecl {
    /// Target filename inside the stack.
    pub name: String,
    pub attributes: toml::Table,
    pub blocks: Vec<BlockDecl>,
}

impl GenerateHclDecl {
    pub fn validate(&self) -> Result<(), String> {
        validate_filename(&self.name)
    }

    pub fn body(&self) -> Result<Body, String> {
        body_from_decl(&self.attributes, &self.blocks)
    }
}

/// Check that `name` is a plain filename.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("generated filename cannot be empty".into());
    }
    if name == "." || name == ".." {
        return Err(format!("invalid generated filename '{}'", name));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!(
            "generated filename '{}' cannot contain path separators",
            name
        ));
    }
    Ok(())
}

/// Convert a TOML value into an unevaluated expression.
///
/// Fails on floats without a JSON representation (`inf`, `nan`).
pub fn to_expr(value: &toml::Value) -> Result<Expr, String> {
    Ok(match value {
        toml::Value::String(s) => Expr::from_text(s.clone()),
        toml::Value::Integer(i) => Expr::Literal(Value::from(*i)),
        toml::Value::Float(f) => {
            let n = serde_json::Number::from_f64(*f)
                .ok_or_else(|| format!("unsupported non-finite number '{f}'"))?;
            Expr::Literal(Value::Number(n))
        }
        toml::Value::Boolean(b) => Expr::Literal(Value::Bool(*b)),
        toml::Value::Datetime(d) => Expr::Literal(Value::String(d.to_string())),
        toml::Value::Array(items) => {
            Expr::List(items.iter().map(to_expr).collect::<Result<_, _>>()?)
        }
        toml::Value::Table(fields) => Expr::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_expr(v)?)))
                .collect::<Result<BTreeMap<_, _>, String>>()?,
        ),
    })
}

fn body_from_decl(attributes: &toml::Table, blocks: &[BlockDecl]) -> Result<Body, String> {
    let attributes = attributes
        .iter()
        .map(|(name, value)| {
            let expr = to_expr(value).map_err(|e| format!("attribute '{name}': {e}"))?;
            Ok(Attribute {
                name: name.clone(),
                expr,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let blocks = blocks
        .iter()
        .map(|b| {
            Ok(Block {
                kind: b.kind.clone(),
                labels: b.labels.clone(),
                body: body_from_decl(&b.attributes, &b.blocks)?,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(Body { attributes, blocks })
}
