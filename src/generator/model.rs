//! Project configuration read from the YAML module description.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

use crate::generator::error::GeneratorError;

/// Reserved module attribute naming the module's location.
pub const SOURCE_KEY: &str = "source";

const REGION_KEY: &str = "region";
const MODULES_KEY: &str = "modules";
const BACKEND_KEY: &str = "backend";
const BACKEND_TYPE_KEY: &str = "type";

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("Invalid identifier regex"));

/// A named module and its attributes, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub attributes: Map<String, Value>,
}

/// Terraform backend settings, rendered inside the `terraform` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,
    /// Top-level scalars other than `region`.
    pub settings: Map<String, Value>,
    pub modules: Vec<ModuleConfig>,
}

impl ProjectConfig {
    /// Read and parse a YAML project description.
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GeneratorError::ConfigNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_yaml_str(&text)
    }

    /// Duplicate mapping keys are rejected rather than silently merged.
    pub fn from_yaml_str(text: &str) -> Result<Self, GeneratorError> {
        let document: serde_yaml::Value = serde_yaml::from_str(text)?;
        let value = serde_json::to_value(document)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, GeneratorError> {
        let root = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(GeneratorError::InvalidConfig(format!(
                    "top level must be a mapping, found {}",
                    kind_of(&other)
                )))
            }
        };

        let mut config = Self::default();

        for (key, value) in root {
            match key.as_str() {
                REGION_KEY => config.region = parse_region(value)?,
                MODULES_KEY => config.modules = parse_modules(value)?,
                BACKEND_KEY => config.backend = parse_backend(value)?,
                _ => match value {
                    Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                        ensure_identifier("setting", &key)?;
                        config.settings.insert(key, value);
                    }
                    Value::Null => warn!(key = %key, "Ignoring top-level setting with no value"),
                    other => warn!(
                        key = %key,
                        kind = kind_of(&other),
                        "Ignoring non-scalar top-level setting"
                    ),
                },
            }
        }

        Ok(config)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// Derive the generated project's directory name from the configuration
/// file name, dropping the last extension.
pub fn project_name(config_path: &Path) -> Result<String, GeneratorError> {
    config_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            GeneratorError::InvalidConfig(format!(
                "cannot derive a project name from '{}'",
                config_path.display()
            ))
        })
}

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

fn ensure_identifier(kind: &'static str, name: &str) -> Result<(), GeneratorError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(GeneratorError::InvalidIdentifier {
            kind,
            name: name.to_string(),
        })
    }
}

fn parse_region(value: Value) -> Result<Option<String>, GeneratorError> {
    match value {
        Value::Null => Ok(None),
        Value::String(region) => Ok(Some(region)),
        other => Err(GeneratorError::InvalidConfig(format!(
            "'region' must be a string, found {}",
            kind_of(&other)
        ))),
    }
}

fn parse_modules(value: Value) -> Result<Vec<ModuleConfig>, GeneratorError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(GeneratorError::InvalidConfig(format!(
                "'modules' must be a mapping, found {}",
                kind_of(&other)
            )))
        }
    };

    let mut modules = Vec::with_capacity(entries.len());
    for (name, body) in entries {
        ensure_identifier("module", &name)?;

        let mut attributes = match body {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(GeneratorError::InvalidConfig(format!(
                    "module '{}' must be a mapping, found {}",
                    name,
                    kind_of(&other)
                )))
            }
        };

        let source = match attributes.shift_remove(SOURCE_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(source)) => Some(source),
            Some(other) => {
                return Err(GeneratorError::InvalidConfig(format!(
                    "'source' of module '{}' must be a string, found {}",
                    name,
                    kind_of(&other)
                )))
            }
        };

        // Attributes become module argument names and part of variable names.
        for attribute in attributes.keys() {
            ensure_identifier("attribute", attribute)?;
        }

        modules.push(ModuleConfig {
            name,
            source,
            attributes,
        });
    }

    Ok(modules)
}

fn parse_backend(value: Value) -> Result<Option<BackendConfig>, GeneratorError> {
    let mut settings = match value {
        Value::Null => return Ok(None),
        Value::Object(map) => map,
        other => {
            return Err(GeneratorError::InvalidConfig(format!(
                "'backend' must be a mapping, found {}",
                kind_of(&other)
            )))
        }
    };

    let kind = match settings.shift_remove(BACKEND_TYPE_KEY) {
        Some(Value::String(kind)) if !kind.is_empty() => kind,
        _ => {
            return Err(GeneratorError::InvalidConfig(
                "'backend' requires a string 'type'".to_string(),
            ))
        }
    };
    ensure_identifier("backend", &kind)?;
    for key in settings.keys() {
        ensure_identifier("backend setting", key)?;
    }

    Ok(Some(BackendConfig { kind, settings }))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
