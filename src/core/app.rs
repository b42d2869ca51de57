use crate::config::{self, Config};
use crate::generator::model::ProjectConfig;
use crate::generator::project::{GeneratedProject, Generator, GeneratorOptions};
use crate::shared::credentials::{self, CredentialError};
use crate::shared::logging;
use crate::terraform::service::{CommandRunner, TerraformBinary, TerraformError, TerraformService};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for `tfgen generate`.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub config_path: PathBuf,
    /// Run `apply -auto-approve` instead of `plan`.
    pub apply: bool,
    /// Stop after writing the project.
    pub skip_terraform: bool,
    pub output_dir: Option<PathBuf>,
    pub skip_credential_check: bool,
    pub allow_missing_source: bool,
}

/// Options for `tfgen destroy`.
#[derive(Debug, Clone, Default)]
pub struct DestroyRequest {
    pub config_path: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub skip_credential_check: bool,
}

pub struct App {
    config: Config,
    runner: Option<Arc<dyn CommandRunner>>,
}

impl App {
    pub fn new(config_path: Option<String>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => {
                logging::info(&format!("Using config file: {}", path));
                config::init_from_path(&path)?
            }
            None => config::init_default()?,
        };
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            runner: None,
        }
    }

    /// Use `runner` instead of locating the terraform executable.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generator(&self, output_dir: Option<&Path>, allow_missing_source: bool) -> Generator {
        let mut options = GeneratorOptions::from_config(&self.config, self.output_root(output_dir));
        if allow_missing_source {
            options.require_source = false;
        }
        Generator::new(options)
    }

    /// Generate the project, then plan or apply it unless `skip_terraform`.
    pub async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GeneratedProject> {
        if !request.skip_terraform {
            self.check_credentials(request.skip_credential_check)?;
        }

        let generator = self.generator(
            request.output_dir.as_deref(),
            request.allow_missing_source,
        );
        let project = generator.generate(&request.config_path)?;

        logging::info(&format!(
            "Generated project '{}' at {} ({} modules, {} variables)",
            project.name,
            project.root.display(),
            project.modules.len(),
            project.variables.len()
        ));

        if request.skip_terraform {
            return Ok(project);
        }

        let service = self.terraform_service(project.root.clone())?;
        service.deploy(request.apply).await?;
        logging::info(if request.apply {
            "Terraform apply completed"
        } else {
            "Terraform plan completed"
        });

        Ok(project)
    }

    /// Destroy the infrastructure of a previously generated project.
    pub async fn destroy(&self, request: &DestroyRequest) -> anyhow::Result<()> {
        let project_dir = self
            .generator(request.output_dir.as_deref(), false)
            .project_dir(&request.config_path)?;

        if !project_dir.is_dir() {
            return Err(TerraformError::ProjectMissing(project_dir).into());
        }

        self.check_credentials(request.skip_credential_check)?;

        logging::info("Executing Terraform destroy operation");
        let service = self.terraform_service(project_dir)?;
        service.teardown().await?;
        Ok(())
    }

    /// Parsed project configuration as pretty JSON.
    pub fn show(&self, config_path: &Path) -> anyhow::Result<String> {
        let project = ProjectConfig::load(config_path)?;
        Ok(serde_json::to_string_pretty(&project)?)
    }

    fn output_root(&self, output_dir: Option<&Path>) -> PathBuf {
        match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => self
                .config
                .terraform
                .output_root
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    fn check_credentials(&self, skip: bool) -> Result<(), CredentialError> {
        if skip || !self.config.credentials.check {
            logging::debug("Skipping AWS credential check");
            return Ok(());
        }
        let source = credentials::check_aws()?;
        logging::debug(&format!("AWS credentials found: {:?}", source));
        Ok(())
    }

    fn terraform_service(&self, project_dir: PathBuf) -> Result<TerraformService, TerraformError> {
        let runner: Arc<dyn CommandRunner> = match &self.runner {
            Some(runner) => runner.clone(),
            None => Arc::new(TerraformBinary::locate(
                self.config.terraform.executable_path.as_deref(),
            )?),
        };
        Ok(TerraformService::new(runner, project_dir))
    }
}

/// Process exit status for a failed command: terraform's own exit code when
/// it failed, 1 for everything else.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TerraformError>() {
        Some(TerraformError::CommandFailed { code, .. }) if *code != 0 => *code,
        _ => 1,
    }
}
