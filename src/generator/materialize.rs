//! Populating `modules/<name>/` inside a generated project.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Module sources Terraform fetches itself: registry addresses and
/// go-getter style URLs.
static REMOTE_SOURCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[a-z][a-z0-9+.-]*::|https?://|git@|github\.com/|bitbucket\.org/|(?:[A-Za-z0-9.-]+\.[A-Za-z]{2,}/)?[A-Za-z0-9][A-Za-z0-9_-]*/[A-Za-z0-9][A-Za-z0-9_-]*/[A-Za-z0-9]+(?://.*)?$)",
    )
    .expect("Invalid remote source regex")
});

/// Where a module's code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    /// Path on the local filesystem, resolved against the configuration's
    /// directory. May not exist.
    Local(PathBuf),
    /// Registry address or URL, passed to Terraform unchanged.
    Remote(String),
}

/// Classify a `source` value. Paths that exist on disk are always local.
pub fn classify_source(source: &str, base_dir: &Path) -> ModuleSource {
    let resolved = base_dir.join(source);
    if resolved.exists() {
        return ModuleSource::Local(resolved);
    }
    let explicitly_local =
        source.starts_with("./") || source.starts_with("../") || Path::new(source).is_absolute();
    if !explicitly_local && REMOTE_SOURCE_REGEX.is_match(source) {
        return ModuleSource::Remote(source.to_string());
    }
    ModuleSource::Local(resolved)
}

/// Files of a synthesized placeholder module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSkeleton {
    pub main_tf: String,
    pub variables_tf: String,
    pub outputs_tf: String,
}

/// How `modules/<name>/` gets its contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Materialization {
    /// Replace the directory with a copy of an existing local source.
    Copy { from: PathBuf },
    /// Write a placeholder unless the directory already exists.
    Skeleton(ModuleSkeleton),
    /// Nothing to write; Terraform downloads the module on init.
    Remote,
}

/// What [`materialize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    Copied,
    Synthesized,
    KeptExisting,
    Skipped,
}

/// Apply a materialization for module `name` under `modules_dir`.
pub fn materialize(
    modules_dir: &Path,
    name: &str,
    materialization: &Materialization,
) -> io::Result<MaterializeOutcome> {
    let target = modules_dir.join(name);
    match materialization {
        Materialization::Copy { from } => {
            replace_with_copy(from, &target)?;
            info!(module = name, from = %from.display(), "Copied module source");
            Ok(MaterializeOutcome::Copied)
        }
        Materialization::Skeleton(skeleton) => {
            if target.exists() {
                debug!(module = name, "Module directory exists, leaving it untouched");
                return Ok(MaterializeOutcome::KeptExisting);
            }
            write_skeleton(&target, skeleton)?;
            info!(module = name, "Synthesized placeholder module");
            Ok(MaterializeOutcome::Synthesized)
        }
        Materialization::Remote => Ok(MaterializeOutcome::Skipped),
    }
}

fn write_skeleton(target: &Path, skeleton: &ModuleSkeleton) -> io::Result<()> {
    fs::create_dir_all(target)?;
    fs::write(target.join("main.tf"), &skeleton.main_tf)?;
    fs::write(target.join("variables.tf"), &skeleton.variables_tf)?;
    fs::write(target.join("outputs.tf"), &skeleton.outputs_tf)?;
    Ok(())
}

/// Remove `target` and recreate it as a recursive copy of `source`. A file
/// source is copied into `target` under its own name.
pub fn replace_with_copy(source: &Path, target: &Path) -> io::Result<()> {
    let source = source.canonicalize()?;

    if let Ok(existing) = target.canonicalize() {
        if existing == source {
            debug!(path = %source.display(), "Module source is already in place");
            return Ok(());
        }
    }

    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;

    if source.is_file() {
        let file_name = source.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "module source has no file name")
        })?;
        fs::copy(&source, target.join(file_name))?;
        return Ok(());
    }

    // The target may live inside the source tree, e.g. `source: .`
    let target = target.canonicalize()?;

    for entry in WalkDir::new(&source)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !e.path().starts_with(&target))
    {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(&source)
            .map_err(io::Error::other)?;
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
        }
    }

    Ok(())
}
