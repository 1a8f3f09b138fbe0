use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

/// All computed paths used by ghctx
#[derive(Debug, Clone)]
pub struct Paths {
    /// `<config>/ghctx` (e.g. ~/.config/ghctx)
    pub base_dir: PathBuf,
    /// `<config>/ghctx/contexts`
    pub contexts_dir: PathBuf,
    /// `<config>/ghctx/state.json`
    pub state_file: PathBuf,
    /// ~/.ssh/config
    pub ssh_config: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;

        let base_dir = base_dirs.config_dir().join("ghctx");
        let contexts_dir = base_dir.join("contexts");
        let state_file = base_dir.join("state.json");
        let ssh_config = base_dirs.home_dir().join(".ssh").join("config");

        Ok(Self {
            base_dir,
            contexts_dir,
            state_file,
            ssh_config,
        })
    }

    /// Get the path to a named context's file
    pub fn context_file(&self, name: &str) -> PathBuf {
        self.contexts_dir.join(format!("{name}.json"))
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.contexts_dir).with_context(|| {
            format!(
                "Failed to create contexts directory: {:?}",
                self.contexts_dir
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_file_path() {
        let paths = Paths::new().unwrap();
        let context_path = paths.context_file("work");
        assert!(context_path.ends_with("contexts/work.json"));
    }

    #[test]
    fn test_ssh_config_under_home() {
        let paths = Paths::new().unwrap();
        assert!(paths.ssh_config.ends_with(".ssh/config"));
    }
}
