//! GitHub CLI authentication operations.
//!
//! ghctx never talks to GitHub itself. It shells out to the `gh` binary and
//! treats it as an oracle for "is user X logged in on host Y"; `gh` owns its
//! own credential storage, network calls, and timeout policy.

use anyhow::{Context, Result, bail};
use std::process::{Command, Output};

fn gh(args: &[&str]) -> Result<Output> {
    Command::new("gh")
        .args(args)
        .output()
        .context("Failed to run 'gh'. Is the GitHub CLI installed and on PATH?")
}

/// Check whether the `gh` binary is available at all
pub fn gh_available() -> bool {
    Command::new("gh")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check if a specific user is logged in on a host
pub fn is_user_logged_in(hostname: &str, user: &str) -> Result<bool> {
    let output = gh(&["auth", "status", "--hostname", hostname])?;
    if !output.status.success() {
        // Not authenticated on this host at all
        return Ok(false);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = format!("Logged in to {hostname} account {user}");
    Ok(stdout.contains(&expected))
}

/// Switch the gh CLI to a specific user on a host
pub fn switch_user(hostname: &str, user: &str) -> Result<()> {
    let output = gh(&["auth", "switch", "--hostname", hostname, "--user", user])?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "gh auth switch failed for {}@{}: {}",
            user,
            hostname,
            stderr.trim()
        );
    }
    Ok(())
}

/// Check if there's an auth token for the given host
pub fn has_token(hostname: &str) -> bool {
    gh(&["auth", "token", "--hostname", hostname])
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Raw `gh auth status` output for a hostname.
///
/// `gh auth status` exits non-zero when nobody is logged in but still prints
/// useful information, so the failure case falls back to stderr.
pub fn auth_status(hostname: &str) -> Result<String> {
    let output = gh(&["auth", "status", "--hostname", hostname])?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }
}

/// Verify the user is logged in on the host and make them the active gh
/// account. Returns false when the user has no usable authentication.
pub fn ensure_user(hostname: &str, user: &str) -> Result<bool> {
    if !is_user_logged_in(hostname, user)? {
        return Ok(false);
    }
    switch_user(hostname, user)?;
    Ok(true)
}
