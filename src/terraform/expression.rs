//! Detection of attribute values that are Terraform expressions rather than
//! literals.

use serde_json::Value;

use crate::terraform::hcl;

/// Default prefix marking a reference to another module's output.
pub const DEFAULT_EXPRESSION_PREFIX: &str = "module.";

/// Module meta-arguments. They are never inputs of the module itself.
pub const META_ARGUMENTS: &[&str] = &["count", "for_each", "depends_on", "providers", "version"];

/// Meta-arguments that only accept references, rendered bare.
const REFERENCE_ARGUMENTS: &[&str] = &["depends_on", "providers"];

/// Meta-arguments Terraform requires as constants, so they cannot be variables.
const CONSTANT_ARGUMENTS: &[&str] = &["version"];

pub fn is_meta_argument(name: &str) -> bool {
    META_ARGUMENTS.contains(&name)
}

/// An attribute value after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Lifted into a generated variable.
    Literal(Value),
    /// Emitted verbatim on the right-hand side of the module argument.
    Expression(String),
}

impl AttributeValue {
    pub fn is_expression(&self) -> bool {
        matches!(self, AttributeValue::Expression(_))
    }
}

/// Classifies string values by prefix, plus explicit `${...}` wrapping.
#[derive(Debug, Clone)]
pub struct ExpressionMatcher {
    prefixes: Vec<String>,
}

impl Default for ExpressionMatcher {
    fn default() -> Self {
        Self::new([DEFAULT_EXPRESSION_PREFIX])
    }
}

impl ExpressionMatcher {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Classify a module argument. `depends_on` and `providers` are emitted
    /// as references and `version` as an inline constant; everything else
    /// goes through [`ExpressionMatcher::classify`].
    pub fn classify_argument(&self, name: &str, value: &Value) -> AttributeValue {
        if REFERENCE_ARGUMENTS.contains(&name) {
            return AttributeValue::Expression(hcl::reference(value));
        }
        if CONSTANT_ARGUMENTS.contains(&name) {
            return AttributeValue::Expression(hcl::literal(value));
        }
        self.classify(value)
    }

    pub fn classify(&self, value: &Value) -> AttributeValue {
        if let Value::String(text) = value {
            if let Some(inner) = unwrap_interpolation(text) {
                return AttributeValue::Expression(inner.to_string());
            }
            if self.prefixes.iter().any(|p| text.starts_with(p.as_str())) {
                return AttributeValue::Expression(text.clone());
            }
        }
        AttributeValue::Literal(value.clone())
    }
}

/// `${ expr }` as a whole value yields `expr`. Template strings mixing text
/// and interpolations stay literals.
fn unwrap_interpolation(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("${")?.strip_suffix('}')?;
    let inner = inner.trim();
    if inner.is_empty() || inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner)
}
