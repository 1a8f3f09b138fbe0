//! Test utilities shared across test modules
//!
//! This module provides common helper functions for testing, avoiding duplication
//! across multiple test suites.

use crate::paths::Paths;
use tempfile::TempDir;

/// Create a Paths struct for testing using a temporary directory
///
/// This mimics the real `<config>/ghctx/` and `~/.ssh/` layout inside the
/// temp directory so tests never touch the real home.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths {
        base_dir: temp_dir.path().join("ghctx"),
        contexts_dir: temp_dir.path().join("ghctx/contexts"),
        state_file: temp_dir.path().join("ghctx/state.json"),
        ssh_config: temp_dir.path().join(".ssh/config"),
    }
}
