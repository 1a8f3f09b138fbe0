//! Core context management logic.
//!
//! A context is one GitHub identity: an account login, the host it lives on
//! (github.com or an enterprise instance), and optionally the SSH key that
//! should be active while the context is. Each context is a single JSON file
//! under `<config>/ghctx/contexts/`.

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::paths::Paths;

pub const DEFAULT_HOST: &str = "github.com";

/// One saved GitHub identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    /// GitHub account login
    pub user: String,
    /// Host this account lives on
    pub host: String,
    /// SSH private key to activate with this context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Context {
    pub fn new(name: String, user: String, host: String, ssh_key: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            name,
            user,
            host,
            ssh_key,
            created_at: now,
            updated_at: now,
        }
    }

    /// A `user@host` label for messages and tables
    pub fn identity(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// List available context names, sorted
pub fn list_contexts(paths: &Paths) -> Result<Vec<String>> {
    paths.ensure_dirs()?;

    let mut contexts = Vec::new();
    for entry in fs::read_dir(&paths.contexts_dir)? {
        let entry = entry?;
        let path = entry.path();
        #[allow(clippy::collapsible_if)]
        if path.is_file() {
            if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    contexts.push(name.to_string());
                }
            }
        }
    }
    contexts.sort();
    Ok(contexts)
}

/// Check if a context exists
pub fn context_exists(paths: &Paths, name: &str) -> bool {
    paths.context_file(name).exists()
}

/// Validate context name
///
/// Only allows alphanumeric characters, underscores, and hyphens.
pub fn validate_context_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Context name cannot be empty");
    }

    if name.chars().count() > 64 {
        bail!("Context name cannot be longer than 64 characters");
    }

    // Allow a-z, A-Z, 0-9, -, _
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!(
            "Invalid context name '{}'.\n\n Only alphanumeric characters, hyphens (-), and underscores (_) are allowed.",
            name
        );
    }

    Ok(())
}

/// Load a context by name
pub fn load_context(paths: &Paths, name: &str) -> Result<Context> {
    let path = paths.context_file(name);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read context file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse context file: {}", path.display()))
}

/// Persist a new context
pub fn create_context(paths: &Paths, context: &Context) -> Result<()> {
    validate_context_name(&context.name)?;
    paths.ensure_dirs()?;

    let path = paths.context_file(&context.name);
    if path.exists() {
        bail!("Context file already exists: {}", path.display());
    }

    let content = serde_json::to_string_pretty(context).context("Failed to serialize context")?;
    fs::write(&path, content)
        .with_context(|| format!("Failed to write context file: {}", path.display()))?;

    Ok(())
}

/// Remove a context
pub fn remove_context(paths: &Paths, name: &str) -> Result<()> {
    let path = paths.context_file(name);

    if !path.exists() {
        bail!("Context '{}' does not exist", name);
    }

    fs::remove_file(&path)
        .with_context(|| format!("Failed to remove context file: {}", path.display()))?;

    Ok(())
}
