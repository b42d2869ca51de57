// Re-export modules for testing and external use
pub mod generator {
    pub mod error;
    pub mod gitignore;
    pub mod materialize;
    pub mod model;
    pub mod project;

    // Re-export commonly used items
    pub use error::GeneratorError;
    pub use model::{BackendConfig, ModuleConfig, ProjectConfig};
    pub use project::{GeneratedProject, Generator, GeneratorOptions, RenderedProject};
}

pub mod terraform {
    pub mod expression;
    pub mod hcl;
    pub mod model;
    pub mod service;

    pub use expression::{AttributeValue, ExpressionMatcher};
    pub use service::{CommandRunner, TerraformBinary, TerraformError, TerraformService};
}

pub mod shared {
    pub mod credentials;
    pub mod logging;
}

pub mod core {
    pub mod app;
}

pub mod config;

// Re-export commonly used types for easier testing and external use
pub use crate::core::app::{App, DestroyRequest, GenerateRequest};
pub use config::Config;
pub use generator::{Generator, GeneratorError, ProjectConfig};
pub use terraform::service::TerraformService;
