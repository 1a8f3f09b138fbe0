//! Repository context binding.
//!
//! A git repository can pin a context by name in a `.ghcontext` file at its
//! root; `ghctx apply` and the shell hook read it to switch automatically.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the binding file at the repository root
pub const BINDING_FILE: &str = ".ghcontext";

/// Root of the enclosing git repository, or None outside one
pub fn repo_root() -> Result<Option<PathBuf>> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .context("Failed to run 'git'. Is git installed and on PATH?")?;

    if !output.status.success() {
        return Ok(None);
    }

    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(root)))
    }
}

/// Read the bound context name, if the repository has one
pub fn read_binding(root: &Path) -> Result<Option<String>> {
    let path = root.join(BINDING_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let name = content.trim().to_string();
    if name.is_empty() { Ok(None) } else { Ok(Some(name)) }
}

/// Bind a context name to the repository
pub fn write_binding(root: &Path, name: &str) -> Result<()> {
    let path = root.join(BINDING_FILE);
    fs::write(&path, format!("{name}\n"))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Remove the binding. Returns whether one existed.
pub fn clear_binding(root: &Path) -> Result<bool> {
    let path = root.join(BINDING_FILE);
    if !path.exists() {
        return Ok(false);
    }

    fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}
