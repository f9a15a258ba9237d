//! core::hcl
//!
//! HCL body model and deterministic writer.
//!
//! # Model
//!
//! A [`Body`] holds attributes (name → unevaluated [`Expr`]) followed by
//! nested [`Block`]s. Bodies are evaluated and rendered in one pass by
//! [`render_body`]; any evaluation failure aborts the whole rendering so no
//! partial text is ever produced.
//!
//! # Format
//!
//! - Two-space indentation
//! - `=` aligned across consecutive attributes of the same body
//! - Lists inline, objects one key per line
//! - A blank line before a block that follows other content
//!
//! An empty body renders to the empty string.

use super::eval::{EvalError, Evaluator, Expr, Value};

/// A named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expr,
}

/// A block such as `terraform { ... }` or `backend "gcs" { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
}

/// Contents of a block or file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.blocks.is_empty()
    }
}

/// Evaluate and render `body` at the top level.
pub fn render_body(body: &Body, ev: &dyn Evaluator) -> Result<String, EvalError> {
    if body.is_empty() {
        return Ok(String::new());
    }
    let mut w = HclWriter::new();
    w.write_body(body, ev)?;
    Ok(w.finish())
}

/// Incremental HCL text builder.
#[derive(Debug, Default)]
pub struct HclWriter {
    out: String,
    depth: usize,
    pending: Vec<(String, Value)>,
    // Whether something was already written at the current depth.
    wrote: Vec<bool>,
}

impl HclWriter {
    pub fn new() -> Self {
        Self {
            wrote: vec![false],
            ..Default::default()
        }
    }

    /// Queue an attribute; consecutive attributes are aligned on flush.
    pub fn attribute(&mut self, name: &str, value: Value) {
        self.pending.push((name.to_string(), value));
    }

    pub fn open_block(&mut self, kind: &str, labels: &[String]) {
        self.flush();
        if self.mark_written() {
            self.out.push('\n');
        }
        self.indent();
        self.out.push_str(kind);
        for label in labels {
            self.out.push(' ');
            self.out.push_str(&quote(label));
        }
        self.out.push_str(" {\n");
        self.depth += 1;
        self.wrote.push(false);
    }

    pub fn close_block(&mut self) {
        self.flush();
        self.wrote.pop();
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("}\n");
    }

    /// Evaluate every attribute of `body` and write it with its blocks.
    pub fn write_body(&mut self, body: &Body, ev: &dyn Evaluator) -> Result<(), EvalError> {
        for attr in &body.attributes {
            let value = ev.eval(&attr.expr)?;
            self.attribute(&attr.name, value);
        }
        for block in &body.blocks {
            self.open_block(&block.kind, &block.labels);
            self.write_body(&block.body, ev)?;
            self.close_block();
        }
        Ok(())
    }

    pub fn finish(mut self) -> String {
        self.flush();
        self.out
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.mark_written();
        let pending = std::mem::take(&mut self.pending);
        let width = pending.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (name, value) in pending {
            self.indent();
            self.out.push_str(&format!("{name:<width$} = "));
            let rendered = render_value(&value, self.depth);
            self.out.push_str(&rendered);
            self.out.push('\n');
        }
    }

    /// Record output at the current depth, returning whether some existed.
    fn mark_written(&mut self) -> bool {
        match self.wrote.last_mut() {
            Some(flag) => std::mem::replace(flag, true),
            None => false,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }
}

/// Render a value as an HCL expression at indentation `depth`.
pub fn render_value(value: &Value, depth: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(|v| render_value(v, depth)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) if fields.is_empty() => "{}".to_string(),
        Value::Object(fields) => {
            let pad = "  ".repeat(depth + 1);
            let keys: Vec<String> = fields.keys().map(|k| object_key(k)).collect();
            let width = keys.iter().map(String::len).max().unwrap_or(0);
            let mut out = String::from("{\n");
            for (key, v) in keys.iter().zip(fields.values()) {
                out.push_str(&format!(
                    "{pad}{key:<width$} = {}\n",
                    render_value(v, depth + 1)
                ));
            }
            out.push_str(&"  ".repeat(depth));
            out.push('}');
            out
        }
    }
}

/// Quote and escape a string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn object_key(key: &str) -> String {
    let mut chars = key.chars();
    let ident = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    };
    if ident {
        key.to_string()
    } else {
        quote(key)
    }
}
