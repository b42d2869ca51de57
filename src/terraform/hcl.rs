//! Minimal HCL text emission: blocks, attributes and literal values.
//!
//! Output follows `terraform fmt` conventions: two-space indentation and
//! `=` signs aligned within a run of attributes.

use serde_json::Value;

const INDENT: &str = "  ";

/// A block such as `module "vpc" { ... }` with attributes followed by
/// nested blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    header: String,
    attributes: Vec<(String, String)>,
    children: Vec<Block>,
}

impl Block {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, rhs: impl Into<String>) -> Self {
        self.push_attribute(key, rhs);
        self
    }

    pub fn push_attribute(&mut self, key: impl Into<String>, rhs: impl Into<String>) {
        self.attributes.push((key.into(), rhs.into()));
    }

    pub fn child(mut self, block: Block) -> Self {
        self.children.push(block);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out, 0);
        out
    }

    fn write_to(&self, out: &mut String, depth: usize) {
        let indent = INDENT.repeat(depth);

        if self.attributes.is_empty() && self.children.is_empty() {
            out.push_str(&format!("{}{} {{}}\n", indent, self.header));
            return;
        }

        out.push_str(&format!("{}{} {{\n", indent, self.header));

        let width = self
            .attributes
            .iter()
            .map(|(key, _)| key.chars().count())
            .max()
            .unwrap_or(0);
        for (key, rhs) in &self.attributes {
            out.push_str(&format!(
                "{}{}{:<width$} = {}\n",
                indent,
                INDENT,
                key,
                rhs,
                width = width
            ));
        }

        for (i, child) in self.children.iter().enumerate() {
            if i > 0 || !self.attributes.is_empty() {
                out.push('\n');
            }
            child.write_to(out, depth + 1);
        }

        out.push_str(&format!("{}}}\n", indent));
    }
}

/// Join blocks with a blank line between them.
pub fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `kind "label1" "label2"`
pub fn header(kind: &str, labels: &[&str]) -> String {
    let mut header = kind.to_string();
    for label in labels {
        header.push(' ');
        header.push_str(&quote(label));
    }
    header
}

/// Quote a string as an HCL string literal. `${` and `%{` are escaped so the
/// value is never interpreted as a template.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a JSON value as an HCL literal expression.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            if map.is_empty() {
                return "{}".to_string();
            }
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} = {}", quote(k), literal(v)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
    }
}

/// Render a JSON value as an HCL expression in which strings are bare
/// references (`module.vpc`, `aws.west`) and mapping keys are unquoted.
pub fn reference(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(reference).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            if map.is_empty() {
                return "{}".to_string();
            }
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} = {}", k, reference(v)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
        other => literal(other),
    }
}
