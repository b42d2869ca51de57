use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default ignore list for a generated Terraform project.
pub const DEFAULT_GITIGNORE: &str = "\
# Terraform
*.tfstate
*.tfstate.*
.terraform/
crash.log
override.tf
override.tf.json
*_override.tf
*_override.tf.json

# Logs
*.log

# OS files
.DS_Store
Thumbs.db
";

/// Write `.gitignore` into `dir`, creating the directory if needed.
pub fn write_gitignore(dir: &Path, content: Option<&str>) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(".gitignore");
    fs::write(&path, content.unwrap_or(DEFAULT_GITIGNORE))?;
    Ok(path)
}
