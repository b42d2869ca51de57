use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

pub const TERRAFORM_BINARY_ENV: &str = "TERRAFORM_BINARY_NAME";
const DEFAULT_BINARY_NAME: &str = "terraform";

#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("Terraform binary not found: {0}")]
    BinaryNotFound(String),

    #[error("Project directory '{}' does not exist", .0.display())]
    ProjectMissing(PathBuf),

    #[error("`terraform {command}` failed with exit code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Executes terraform subcommands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run terraform with `args` in `working_dir` and return its exit code.
    async fn run(&self, working_dir: &Path, args: &[&str]) -> Result<i32, TerraformError>;
}

/// The real terraform executable. Output goes straight to the terminal.
#[derive(Debug, Clone)]
pub struct TerraformBinary {
    path: PathBuf,
}

impl TerraformBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the executable from an explicit path, `TERRAFORM_BINARY_NAME`,
    /// or `terraform` on PATH.
    pub fn locate(explicit: Option<&str>) -> Result<Self, TerraformError> {
        if let Some(path) = explicit {
            let path_buf = PathBuf::from(path);
            if path_buf.is_file() {
                info!(path = %path_buf.display(), "Using specified Terraform binary");
                return Ok(Self::new(path_buf));
            }
            return Err(TerraformError::BinaryNotFound(path.to_string()));
        }

        let name = std::env::var(TERRAFORM_BINARY_ENV)
            .unwrap_or_else(|_| DEFAULT_BINARY_NAME.to_string());
        match which::which(&name) {
            Ok(path) => {
                info!(binary = %name, path = %path.display(), "Found Terraform binary");
                Ok(Self::new(path))
            }
            Err(_) => Err(TerraformError::BinaryNotFound(name)),
        }
    }
}

#[async_trait]
impl CommandRunner for TerraformBinary {
    async fn run(&self, working_dir: &Path, args: &[&str]) -> Result<i32, TerraformError> {
        let status = Command::new(&self.path)
            .args(args)
            .current_dir(working_dir)
            .status()
            .await?;

        // Killed by a signal
        Ok(status.code().unwrap_or(1))
    }
}

/// Runs terraform workflows against one project directory.
pub struct TerraformService {
    runner: Arc<dyn CommandRunner>,
    project_directory: PathBuf,
}

impl TerraformService {
    pub fn new(runner: Arc<dyn CommandRunner>, project_directory: PathBuf) -> Self {
        debug!(
            project = %project_directory.display(),
            "TerraformService initialized"
        );
        Self {
            runner,
            project_directory,
        }
    }

    pub fn get_project_directory(&self) -> &PathBuf {
        &self.project_directory
    }

    pub async fn init(&self) -> Result<(), TerraformError> {
        self.run_step(&["init"]).await
    }

    pub async fn plan(&self) -> Result<(), TerraformError> {
        self.run_step(&["plan"]).await
    }

    pub async fn apply(&self, auto_approve: bool) -> Result<(), TerraformError> {
        if auto_approve {
            self.run_step(&["apply", "-auto-approve"]).await
        } else {
            self.run_step(&["apply"]).await
        }
    }

    pub async fn destroy(&self, auto_approve: bool) -> Result<(), TerraformError> {
        if auto_approve {
            self.run_step(&["destroy", "-auto-approve"]).await
        } else {
            self.run_step(&["destroy"]).await
        }
    }

    /// `init`, then `apply -auto-approve` or `plan`.
    pub async fn deploy(&self, apply: bool) -> Result<(), TerraformError> {
        self.ensure_project_exists()?;
        self.init().await?;
        if apply {
            self.apply(true).await
        } else {
            self.plan().await
        }
    }

    /// `init`, then `destroy -auto-approve`. Nothing runs when the project
    /// directory is missing.
    pub async fn teardown(&self) -> Result<(), TerraformError> {
        self.ensure_project_exists()?;
        self.init().await?;
        self.destroy(true).await
    }

    fn ensure_project_exists(&self) -> Result<(), TerraformError> {
        if self.project_directory.is_dir() {
            Ok(())
        } else {
            Err(TerraformError::ProjectMissing(self.project_directory.clone()))
        }
    }

    async fn run_step(&self, args: &[&str]) -> Result<(), TerraformError> {
        let command = args.join(" ");
        info!(
            command = %command,
            project = %self.project_directory.display(),
            "Running terraform"
        );

        let code = self.runner.run(&self.project_directory, args).await?;
        if code != 0 {
            return Err(TerraformError::CommandFailed { command, code });
        }
        Ok(())
    }
}
