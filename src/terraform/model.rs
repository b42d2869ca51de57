use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

use crate::terraform::hcl::{self, Block};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Bool,
    Any,
}

impl VariableType {
    /// Infer the declared type from a literal value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => VariableType::String,
            Value::Number(_) => VariableType::Number,
            Value::Bool(_) => VariableType::Bool,
            Value::Null | Value::Array(_) | Value::Object(_) => VariableType::Any,
        }
    }
}

impl Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::String => write!(f, "string"),
            VariableType::Number => write!(f, "number"),
            VariableType::Bool => write!(f, "bool"),
            VariableType::Any => write!(f, "any"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerraformVariable {
    pub name: String,
    pub description: Option<String>,
    pub type_: VariableType,
}

impl TerraformVariable {
    pub fn new(name: impl Into<String>, type_: VariableType) -> Self {
        Self {
            name: name.into(),
            description: None,
            type_,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn to_block(&self) -> Block {
        let mut block = Block::new(hcl::header("variable", &[self.name.as_str()]));
        if let Some(description) = &self.description {
            block.push_attribute("description", hcl::quote(description));
        }
        block.push_attribute("type", self.type_.to_string());
        block
    }
}

/// A `module` call in the root configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TerraformModuleCall {
    pub name: String,
    pub source: String,
    /// Argument name and rendered right-hand side.
    pub arguments: Vec<(String, String)>,
}

impl TerraformModuleCall {
    pub fn to_block(&self) -> Block {
        let mut block = Block::new(hcl::header("module", &[self.name.as_str()]));
        block.push_attribute("source", hcl::quote(&self.source));
        for (name, rhs) in &self.arguments {
            block.push_attribute(name, rhs);
        }
        block
    }
}
