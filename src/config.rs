//! Tool settings, read from a YAML or JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::shared::logging;
use crate::terraform::expression::DEFAULT_EXPRESSION_PREFIX;

pub const CONFIG_ENV_VAR: &str = "TFGEN_CONFIG";
const CONFIG_DIR_NAME: &str = "tfgen";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub terraform: TerraformConfig,
    pub generator: GeneratorConfig,
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// Explicit path to the terraform executable. Looked up on PATH when unset.
    pub executable_path: Option<String>,
    /// Directory generated projects are placed in. Defaults to the current
    /// directory.
    pub output_root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub require_source: bool,
    pub expression_prefixes: Vec<String>,
    pub provider_source: String,
    pub write_gitignore: bool,
    pub gitignore_content: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            require_source: true,
            expression_prefixes: vec![DEFAULT_EXPRESSION_PREFIX.to_string()],
            provider_source: "hashicorp/aws".to_string(),
            write_gitignore: true,
            gitignore_content: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Require AWS credentials in the environment before running terraform.
    pub check: bool,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self { check: true }
    }
}

/// Load settings from an explicit file. The file must exist.
pub fn init_from_path(path: &str) -> anyhow::Result<Config> {
    load_file(Path::new(path))
}

/// Load settings from `TFGEN_CONFIG` or the user config directory, falling
/// back to defaults when neither exists.
pub fn init_default() -> anyhow::Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        logging::info(&format!("Using config from {}: {}", CONFIG_ENV_VAR, path));
        return load_file(Path::new(&path));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            logging::info(&format!("Using config file: {}", path.display()));
            load_file(&path)
        }
        _ => {
            logging::debug("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn load_file(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
    parse(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file {}: {}", path.display(), e))
}

/// YAML is a superset of JSON, so both formats parse here.
pub fn parse(content: &str) -> Result<Config, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content)
}
