//! core::eval
//!
//! Expression evaluation with injectable namespaces.
//!
//! # Overview
//!
//! The engine treats evaluation as opaque: it creates one [`Evaluator`] per
//! stack, injects the `stack` and `global` namespaces, then evaluates
//! [`Expr`] values taken from configuration.
//!
//! [`TemplateEvaluator`] is the default implementation. Strings containing
//! `${ ... }` are templates whose interpolations are minijinja expressions:
//!
//! - `"${global.region}"` evaluates to the typed value of `global.region`
//! - `"states/${stack.path}"` evaluates to a string
//! - `"$${literal}"` escapes the interpolation and yields `${literal}`
//!
//! Referencing an undefined name is always an error.

use std::collections::BTreeMap;

use minijinja::{Environment, UndefinedBehavior};
use thiserror::Error;

/// Evaluated value.
pub type Value = serde_json::Value;

/// Named values injected into an evaluator (ordered by name).
pub type Namespace = serde_json::Map<String, Value>;

/// Errors from expression evaluation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("invalid namespace name {0:?}")]
    InvalidNamespace(String),

    #[error("invalid expression {expr:?}: {message}")]
    Syntax { expr: String, message: String },

    #[error("evaluating {expr:?}: {message}")]
    Failed { expr: String, message: String },

    #[error("evaluating {expr:?}: undefined value")]
    Undefined { expr: String },

    #[error("evaluating {expr:?}: {kind} value cannot be interpolated into a string")]
    NotInterpolable { expr: String, kind: &'static str },
}

/// An unevaluated configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A value without references.
    Literal(Value),
    /// Template text containing `${ ... }` interpolations.
    Template(String),
    /// A list whose items may reference namespaces.
    List(Vec<Expr>),
    /// An object whose values may reference namespaces.
    Object(BTreeMap<String, Expr>),
}

impl Expr {
    /// Build an expression from a string, detecting templates.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.contains("${") {
            Expr::Template(text)
        } else {
            Expr::Literal(Value::String(text))
        }
    }
}

/// Expression evaluation capability.
pub trait Evaluator {
    /// Inject (or replace) a namespace visible to expressions as `name.*`.
    fn set_namespace(&mut self, name: &str, vars: Namespace) -> Result<(), EvalError>;

    /// Evaluate an expression against the injected namespaces.
    fn eval(&self, expr: &Expr) -> Result<Value, EvalError>;
}

/// Default evaluator: `${ ... }` templates over minijinja expressions.
pub struct TemplateEvaluator {
    env: Environment<'static>,
    namespaces: BTreeMap<String, Value>,
}

impl Default for TemplateEvaluator {
    fn default() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self {
            env,
            namespaces: BTreeMap::new(),
        }
    }
}

impl std::fmt::Debug for TemplateEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEvaluator")
            .field("namespaces", &self.namespaces.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TemplateEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn eval_expression(&self, src: &str) -> Result<Value, EvalError> {
        let expr = self
            .env
            .compile_expression(src)
            .map_err(|e| EvalError::Syntax {
                expr: src.to_string(),
                message: e.to_string(),
            })?;

        let out = expr.eval(&self.namespaces).map_err(|e| EvalError::Failed {
            expr: src.to_string(),
            message: e.to_string(),
        })?;

        if out.is_undefined() {
            return Err(EvalError::Undefined {
                expr: src.to_string(),
            });
        }

        serde_json::to_value(&out).map_err(|e| EvalError::Failed {
            expr: src.to_string(),
            message: e.to_string(),
        })
    }

    fn eval_template(&self, src: &str) -> Result<Value, EvalError> {
        let pieces = split_template(src)?;

        // A lone interpolation keeps the type of its result.
        if let [Piece::Interp(expr)] = pieces.as_slice() {
            return self.eval_expression(expr);
        }

        let mut out = String::new();
        for piece in pieces {
            match piece {
                Piece::Text(text) => out.push_str(&text),
                Piece::Interp(expr) => match self.eval_expression(expr)? {
                    Value::String(s) => out.push_str(&s),
                    Value::Number(n) => out.push_str(&n.to_string()),
                    Value::Bool(b) => out.push_str(if b { "true" } else { "false" }),
                    other => {
                        return Err(EvalError::NotInterpolable {
                            expr: expr.to_string(),
                            kind: value_kind(&other),
                        })
                    }
                },
            }
        }
        Ok(Value::String(out))
    }
}

impl Evaluator for TemplateEvaluator {
    fn set_namespace(&mut self, name: &str, vars: Namespace) -> Result<(), EvalError> {
        if !is_identifier(name) {
            return Err(EvalError::InvalidNamespace(name.to_string()));
        }
        self.namespaces.insert(name.to_string(), Value::Object(vars));
        Ok(())
    }

    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Template(src) => self.eval_template(src),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Object(fields) => {
                let mut out = Namespace::new();
                for (key, item) in fields {
                    out.insert(key.clone(), self.eval(item)?);
                }
                Ok(Value::Object(out))
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Piece<'a> {
    Text(String),
    Interp(&'a str),
}

fn split_template(src: &str) -> Result<Vec<Piece<'_>>, EvalError> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut rest = src;

    while let Some(pos) = rest.find('$') {
        text.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("$${") {
            text.push_str("${");
            rest = after;
            continue;
        }

        let Some(body) = tail.strip_prefix("${") else {
            text.push('$');
            rest = &tail[1..];
            continue;
        };

        let end = closing_brace(body).ok_or_else(|| EvalError::Syntax {
            expr: src.to_string(),
            message: "unclosed interpolation".to_string(),
        })?;
        let expr = body[..end].trim();
        if expr.is_empty() {
            return Err(EvalError::Syntax {
                expr: src.to_string(),
                message: "empty interpolation".to_string(),
            });
        }

        if !text.is_empty() {
            pieces.push(Piece::Text(std::mem::take(&mut text)));
        }
        pieces.push(Piece::Interp(expr));
        rest = &body[end + 1..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(pieces)
}

/// Byte offset of the `}` closing an interpolation body.
///
/// Braces inside `"..."` or `'...'` string literals are ignored.
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in body.char_indices() {
        if let Some(q) = quote {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if ch == q => quote = None,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' | '\'' => quote = Some(ch),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(idx),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
