//! Turns a [`ProjectConfig`] into a Terraform project directory.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::generator::error::GeneratorError;
use crate::generator::gitignore;
use crate::generator::materialize::{
    classify_source, materialize, Materialization, ModuleSkeleton, ModuleSource,
};
use crate::generator::model::{project_name, ModuleConfig, ProjectConfig};
use crate::terraform::expression::{is_meta_argument, AttributeValue, ExpressionMatcher};
use crate::terraform::hcl::{self, Block};
use crate::terraform::model::{TerraformModuleCall, TerraformVariable, VariableType};

pub const MAIN_TF: &str = "main.tf";
pub const VARIABLES_TF: &str = "variables.tf";
pub const TFVARS_JSON: &str = "terraform.tfvars.json";
pub const MODULES_DIR: &str = "modules";

const REGION_VARIABLE: &str = "region";

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Directory the project directory is created in.
    pub output_root: PathBuf,
    /// Fail on modules without `source` instead of synthesizing a skeleton.
    pub require_source: bool,
    pub expression_matcher: ExpressionMatcher,
    /// Provider address for `required_providers`, e.g. `hashicorp/aws`.
    pub provider_source: String,
    pub write_gitignore: bool,
    pub gitignore_content: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            require_source: true,
            expression_matcher: ExpressionMatcher::default(),
            provider_source: "hashicorp/aws".to_string(),
            write_gitignore: true,
            gitignore_content: None,
        }
    }
}

impl GeneratorOptions {
    pub fn from_config(config: &Config, output_root: PathBuf) -> Self {
        let generator = &config.generator;
        Self {
            output_root,
            require_source: generator.require_source,
            expression_matcher: ExpressionMatcher::new(generator.expression_prefixes.iter().cloned()),
            provider_source: generator.provider_source.clone(),
            write_gitignore: generator.write_gitignore,
            gitignore_content: generator.gitignore_content.clone(),
        }
    }
}

/// How one module will be laid out on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ModulePlan {
    pub name: String,
    /// `source` written into the module block.
    pub source: String,
    pub materialization: Materialization,
}

/// Everything the generator writes, computed before touching the disk.
#[derive(Debug, Clone)]
pub struct RenderedProject {
    pub main_tf: String,
    pub variables_tf: String,
    pub variables: Vec<TerraformVariable>,
    pub tfvars: Map<String, Value>,
    pub modules: Vec<ModulePlan>,
}

impl RenderedProject {
    pub fn tfvars_json(&self) -> Result<String, GeneratorError> {
        let mut json = serde_json::to_string_pretty(&self.tfvars)?;
        json.push('\n');
        Ok(json)
    }
}

/// Result of a successful generation run.
#[derive(Debug, Clone)]
pub struct GeneratedProject {
    pub name: String,
    pub root: PathBuf,
    pub modules: Vec<String>,
    pub variables: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Declared variables and their flattened values, with collision checks.
#[derive(Default)]
struct VariableSet {
    declarations: Vec<TerraformVariable>,
    values: Map<String, Value>,
    names: HashSet<String>,
}

impl VariableSet {
    fn lift(&mut self, variable: TerraformVariable, value: Value) -> Result<(), GeneratorError> {
        if !self.names.insert(variable.name.clone()) {
            return Err(GeneratorError::DuplicateVariable(variable.name));
        }
        self.values.insert(variable.name.clone(), value);
        self.declarations.push(variable);
        Ok(())
    }
}

pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Directory a configuration file generates into.
    pub fn project_dir(&self, config_path: &Path) -> Result<PathBuf, GeneratorError> {
        Ok(self.options.output_root.join(project_name(config_path)?))
    }

    /// Load `config_path` and generate the project named after it. Relative
    /// module sources resolve against the file's directory.
    pub fn generate(&self, config_path: &Path) -> Result<GeneratedProject, GeneratorError> {
        let config = ProjectConfig::load(config_path)?;
        let name = project_name(config_path)?;
        let source_root = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        self.generate_from(&name, &config, source_root)
    }

    pub fn generate_from(
        &self,
        name: &str,
        config: &ProjectConfig,
        source_root: &Path,
    ) -> Result<GeneratedProject, GeneratorError> {
        let rendered = self.render(config, source_root)?;
        let root = self.options.output_root.join(name);

        info!(
            project = %root.display(),
            modules = rendered.modules.len(),
            variables = rendered.variables.len(),
            "Generating Terraform project"
        );
        fs::create_dir_all(&root)?;

        let modules_dir = root.join(MODULES_DIR);
        for plan in &rendered.modules {
            let outcome = materialize(&modules_dir, &plan.name, &plan.materialization)?;
            debug!(module = %plan.name, ?outcome, "Module materialized");
        }

        let mut files = vec![
            write_file(&root, MAIN_TF, &rendered.main_tf)?,
            write_file(&root, VARIABLES_TF, &rendered.variables_tf)?,
            write_file(&root, TFVARS_JSON, &rendered.tfvars_json()?)?,
        ];
        if self.options.write_gitignore {
            files.push(gitignore::write_gitignore(
                &root,
                self.options.gitignore_content.as_deref(),
            )?);
        }

        Ok(GeneratedProject {
            name: name.to_string(),
            root,
            modules: rendered.modules.iter().map(|m| m.name.clone()).collect(),
            variables: rendered.variables.iter().map(|v| v.name.clone()).collect(),
            files,
        })
    }

    /// Render all file contents without writing anything. Validation errors
    /// such as a missing `source` surface here.
    pub fn render(
        &self,
        config: &ProjectConfig,
        source_root: &Path,
    ) -> Result<RenderedProject, GeneratorError> {
        let provider = provider_local_name(&self.options.provider_source);
        let mut variables = VariableSet::default();

        if let Some(region) = &config.region {
            variables.lift(
                TerraformVariable::new(REGION_VARIABLE, VariableType::String)
                    .with_description(format!("Region for the {} provider", provider)),
                Value::String(region.clone()),
            )?;
        }
        for (name, value) in &config.settings {
            variables.lift(TerraformVariable::new(name, VariableType::of(value)), value.clone())?;
        }

        let mut blocks = vec![self.terraform_block(config, provider), provider_block(config, provider)];
        let mut modules = Vec::with_capacity(config.modules.len());

        for module in &config.modules {
            let (source, materialization) = self.resolve_source(module, source_root)?;

            let mut arguments = Vec::with_capacity(module.attributes.len());
            for (attribute, value) in &module.attributes {
                match self.options.expression_matcher.classify_argument(attribute, value) {
                    AttributeValue::Expression(expression) => {
                        arguments.push((attribute.clone(), expression));
                    }
                    AttributeValue::Literal(value) => {
                        let variable_name = format!("{}_{}", module.name, attribute);
                        arguments.push((attribute.clone(), format!("var.{}", variable_name)));
                        variables.lift(
                            TerraformVariable::new(&variable_name, VariableType::of(&value))
                                .with_description(format!(
                                    "{} for module {}",
                                    attribute, module.name
                                )),
                            value,
                        )?;
                    }
                }
            }

            blocks.push(
                TerraformModuleCall {
                    name: module.name.clone(),
                    source: source.clone(),
                    arguments,
                }
                .to_block(),
            );
            modules.push(ModulePlan {
                name: module.name.clone(),
                source,
                materialization,
            });
        }

        let declarations: Vec<Block> = variables.declarations.iter().map(|v| v.to_block()).collect();

        Ok(RenderedProject {
            main_tf: hcl::render_blocks(&blocks),
            variables_tf: hcl::render_blocks(&declarations),
            variables: variables.declarations,
            tfvars: variables.values,
            modules,
        })
    }

    fn terraform_block(&self, config: &ProjectConfig, provider: &str) -> Block {
        let mut block = Block::new("terraform").child(Block::new("required_providers").attribute(
            provider,
            format!("{{ source = {} }}", hcl::quote(&self.options.provider_source)),
        ));

        if let Some(backend) = &config.backend {
            let mut backend_block = Block::new(hcl::header("backend", &[backend.kind.as_str()]));
            for (key, value) in &backend.settings {
                backend_block.push_attribute(key, hcl::literal(value));
            }
            block = block.child(backend_block);
        }

        block
    }

    fn resolve_source(
        &self,
        module: &ModuleConfig,
        source_root: &Path,
    ) -> Result<(String, Materialization), GeneratorError> {
        let local = format!("./{}/{}", MODULES_DIR, module.name);

        match &module.source {
            None if self.options.require_source => Err(GeneratorError::MissingSource {
                module: module.name.clone(),
            }),
            None => {
                warn!(module = %module.name, "Module has no source, synthesizing a placeholder");
                Ok((local, Materialization::Skeleton(self.skeleton(module))))
            }
            Some(source) => match classify_source(source, source_root) {
                ModuleSource::Remote(address) => Ok((address, Materialization::Remote)),
                ModuleSource::Local(path) if path.exists() => {
                    Ok((local, Materialization::Copy { from: path }))
                }
                ModuleSource::Local(path) => {
                    debug!(
                        module = %module.name,
                        path = %path.display(),
                        "Module source not found on disk, synthesizing a placeholder"
                    );
                    Ok((local, Materialization::Skeleton(self.skeleton(module))))
                }
            },
        }
    }

    fn skeleton(&self, module: &ModuleConfig) -> ModuleSkeleton {
        let inputs: Vec<Block> = module
            .attributes
            .iter()
            .filter(|(attribute, _)| !is_meta_argument(attribute))
            .map(|(attribute, value)| {
                let type_ = match self.options.expression_matcher.classify(value) {
                    AttributeValue::Literal(value) => VariableType::of(&value),
                    AttributeValue::Expression(_) => VariableType::Any,
                };
                TerraformVariable::new(attribute, type_).to_block()
            })
            .collect();

        ModuleSkeleton {
            main_tf: format!(
                "# Placeholder for module \"{}\".\n# Add the module's resources here.\n",
                module.name
            ),
            variables_tf: hcl::render_blocks(&inputs),
            outputs_tf: format!("# Outputs for module \"{}\".\n", module.name),
        }
    }
}

fn provider_block(config: &ProjectConfig, provider: &str) -> Block {
    let mut block = Block::new(hcl::header("provider", &[provider]));
    if config.region.is_some() {
        block.push_attribute("region", format!("var.{}", REGION_VARIABLE));
    }
    block
}

/// `hashicorp/aws` -> `aws`
fn provider_local_name(provider_source: &str) -> &str {
    provider_source
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(provider_source)
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, GeneratorError> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}
