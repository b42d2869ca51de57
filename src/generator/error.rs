//! Error types for project generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a project configuration or writing
/// the generated project.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("File not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Error parsing YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Module '{module}' has no 'source' attribute")]
    MissingSource { module: String },

    #[error("Invalid {kind} name '{name}': use letters, digits, '_' or '-', not starting with a digit")]
    InvalidIdentifier { kind: &'static str, name: String },

    #[error("Variable '{0}' would be declared more than once")]
    DuplicateVariable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
