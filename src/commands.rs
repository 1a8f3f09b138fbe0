//! High-level command orchestration for the CLI.
//!
//! This module contains the handler functions for each CLI command (`list`,
//! `new`, `use`, etc.). It serves as the coordination layer, interacting with:
//! - `crate::ui` for user interaction (output, prompts).
//! - `crate::paths` for filesystem locations.
//! - `crate::contexts` for the context store.
//! - `crate::auth` for the gh authentication oracle.
//! - `crate::ssh` for SSH key activation.
//! - `crate::repo` for repository bindings.
//! - `crate::state` for persistent state.
//!
//! Each function here generally corresponds to a subcommand in `main.rs`.

use anstyle::AnsiColor;
use anyhow::{Context as _, Result, bail};

use crate::auth;
use crate::contexts::{
    Context,
    context_exists,
    create_context,
    list_contexts,
    load_context,
    remove_context,
    validate_context_name,
};
use crate::paths::Paths;
use crate::repo;
use crate::shell_hook::HookShell;
use crate::ssh;
use crate::state::{LockedState, State};
use crate::ui::Ui;

/// List all saved contexts
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    let contexts = list_contexts(paths)?;

    if contexts.is_empty() {
        ui.warn("No contexts found.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {} new <name> --user <login>", ui.bold("ghctx")));
        return Ok(());
    }

    // Get active context for marking
    let state = State::read(&paths.state_file).unwrap_or_default();
    let current = state.active_context.as_deref();

    // Build table
    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Context"),
        ui.header_cell("Account"),
        ui.header_cell("SSH Key"),
        ui.header_cell("Status"),
    ]);

    for name in &contexts {
        let is_active = Some(name.as_str()) == current;
        let marker = if is_active { ui.icon_active() } else { " " };
        let status_cell = if is_active {
            ui.colored_cell("active", AnsiColor::Green)
        } else {
            ui.cell("-")
        };

        let (account, ssh_key) = match load_context(paths, name) {
            Ok(context) => (
                context.identity(),
                context.ssh_key.unwrap_or_else(|| "-".to_string()),
            ),
            Err(_) => ("?".to_string(), "?".to_string()),
        };

        table.add_row(vec![
            ui.cell(marker),
            ui.cell(name),
            ui.cell(account),
            ui.cell(ssh_key),
            status_cell,
        ]);
    }

    ui.section("Contexts");
    ui.println(table.to_string());

    Ok(())
}

/// Show the active context and its SSH key status
pub fn current(paths: &Paths, ui: &Ui, porcelain: bool) -> Result<()> {
    let state = State::read(&paths.state_file).unwrap_or_default();

    // Machine-readable mode for shell prompts and the auto-apply hook
    if porcelain {
        if let Some(name) = &state.active_context {
            ui.println(name);
        }
        return Ok(());
    }

    ui.section("Current Context");
    ui.newline();

    let mut table = ui.simple_table();

    match &state.active_context {
        Some(name) => {
            table.add_row(vec![ui.cell("Active context:"), ui.header_cell(name)]);
            if let Some(updated) = &state.updated_at {
                table.add_row(vec![
                    ui.cell("Last switched:"),
                    ui.cell(updated.format("%Y-%m-%d %H:%M:%S").to_string()),
                ]);
            }

            match load_context(paths, name) {
                Ok(context) => {
                    table.add_row(vec![ui.cell("Account:"), ui.cell(context.identity())]);

                    if let Some(key) = &context.ssh_key {
                        table.add_row(vec![ui.cell("SSH key:"), ui.cell(key)]);
                    }

                    let config = ssh::ConfigFile::load(&paths.ssh_config)?;
                    let active_cell = match config.active_identity_file(&context.host) {
                        Some(path) => ui.cell(path),
                        None => ui.colored_cell("(none)", AnsiColor::Yellow),
                    };
                    table.add_row(vec![ui.cell("Active identity file:"), active_cell]);
                }
                Err(_) => {
                    table.add_row(vec![
                        ui.cell(""),
                        ui.colored_cell("(context file missing or corrupt)", AnsiColor::Red),
                    ]);
                }
            }
        }
        None => {
            table.add_row(vec![ui.cell("Active context:"), ui.cell("(none)")]);
        }
    }

    ui.println(table.to_string());
    Ok(())
}

/// Create a new context
pub fn new(
    paths: &Paths,
    name: &str,
    user: Option<String>,
    host: String,
    ssh_key: Option<String>,
    ui: &Ui,
) -> Result<()> {
    paths.ensure_dirs()?;
    validate_context_name(name)?;

    if context_exists(paths, name) {
        bail!(
            "Context '{}' already exists.\nHint: Use 'ghctx delete {}' first, or choose a different name.",
            name,
            name
        );
    }

    let user = match user {
        Some(u) => u,
        None => inquire::Text::new("GitHub account login:")
            .prompt()
            .context("Account prompt cancelled")?,
    };
    if user.trim().is_empty() {
        bail!("Account login cannot be empty");
    }

    let context = Context::new(name.to_string(), user.trim().to_string(), host, ssh_key);
    create_context(paths, &context)?;
    ui.ok(format!("Created context '{}' ({})", name, context.identity()));

    // Best effort: make sure the key is listed (inactive) under the host
    // block, so a later `use` only has to flip comment markers.
    if let Some(key) = &context.ssh_key {
        if !ssh::key_exists(key) {
            ui.warn(format!("SSH key '{}' does not exist on disk", key));
        }

        let mut config = ssh::ConfigFile::load(&paths.ssh_config)?;
        match config.add_identity_file(&context.host, key, false) {
            Ok(()) => {
                config.save()?;
                ui.info(format!(
                    "Registered '{}' under Host {} in {}",
                    key,
                    context.host,
                    paths.ssh_config.display()
                ));
            }
            Err(ssh::Error::HostNotFound { .. }) => {
                ui.warn(format!(
                    "No Host block for '{}' in {}; add one to let ghctx manage this key",
                    context.host,
                    paths.ssh_config.display()
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }

    ui.newline();
    ui.println("To activate it:");
    ui.println(format!("  ghctx use {}", name));

    Ok(())
}

/// Switch to a context
pub fn use_context(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    if !context_exists(paths, name) {
        bail!(
            "Context '{}' does not exist.\nHint: Use 'ghctx list' to see available contexts.",
            name
        );
    }

    let context = load_context(paths, name)?;

    let spinner = ui.spinner(format!("Switching to context '{}'...", name));

    match perform_switch(paths, &context) {
        Ok(()) => {
            ui.spinner_finish_ok(
                &spinner,
                format!("Active context: {} ({})", name, context.identity()),
            );
            Ok(())
        }
        Err(e) => {
            ui.spinner_finish_err(&spinner, format!("Failed to switch: {}", e));
            Err(e)
        }
    }
}

fn perform_switch(paths: &Paths, context: &Context) -> Result<()> {
    // 1. The auth oracle: verify and switch the gh account
    if !auth::ensure_user(&context.host, &context.user)? {
        bail!(
            "{} is not logged in on {}.\nHint: Run 'gh auth login --hostname {}' first.",
            context.user,
            context.host,
            context.host
        );
    }

    // 2. Activate the context's SSH key, if it has one
    if let Some(key) = &context.ssh_key {
        let mut config = ssh::ConfigFile::load(&paths.ssh_config)?;
        config.activate_key(&context.host, key)?;
        config.save()?;
    }

    // 3. Record the switch
    let mut locked = LockedState::lock(&paths.state_file)?;
    locked.update(|s| {
        s.active_context = Some(context.name.clone());
    })?;

    Ok(())
}

/// Delete a context
pub fn delete(paths: &Paths, name: &str, force: bool, ui: &Ui) -> Result<()> {
    if !context_exists(paths, name) {
        bail!(
            "Context '{}' does not exist.\nHint: Use 'ghctx list' to see available contexts.",
            name
        );
    }

    // Refuse to delete the active context
    let state = State::read(&paths.state_file).unwrap_or_default();
    if state.active_context.as_deref() == Some(name) {
        bail!(
            "Cannot delete '{}' because it is the active context.\nHint: Switch to another context first with 'ghctx use <other-context>'.",
            name
        );
    }

    if !force {
        let confirm =
            inquire::Confirm::new(&format!("Are you sure you want to delete context '{}'?", name))
                .with_default(false)
                .with_help_message("This only removes the saved context, not gh credentials")
                .prompt()
                .context("Confirmation cancelled")?;

        if !confirm {
            ui.warn("Deletion cancelled.");
            return Ok(());
        }
    }

    remove_context(paths, name)?;

    ui.ok(format!("Deleted context '{}'", name));
    Ok(())
}

/// Bind a context to the current git repository
pub fn bind(paths: &Paths, name: Option<&str>, ui: &Ui) -> Result<()> {
    let name = match name {
        Some(n) => n.to_string(),
        None => State::read(&paths.state_file)
            .unwrap_or_default()
            .active_context
            .context("No context given and none active.\nHint: Pass a name: 'ghctx bind <name>'.")?,
    };

    if !context_exists(paths, &name) {
        bail!(
            "Context '{}' does not exist.\nHint: Use 'ghctx list' to see available contexts.",
            name
        );
    }

    let root = repo::repo_root()?.context("Not inside a git repository")?;
    repo::write_binding(&root, &name)?;

    ui.ok(format!("Bound context '{}' to {}", name, root.display()));
    ui.println(ui.dim(format!(
        "  {} will be applied here by the shell hook",
        name
    )));
    Ok(())
}

/// Remove the current repository's context binding
pub fn unbind(ui: &Ui) -> Result<()> {
    let root = repo::repo_root()?.context("Not inside a git repository")?;

    if repo::clear_binding(&root)? {
        ui.ok(format!("Removed context binding from {}", root.display()));
    } else {
        ui.warn("No context bound to this repository.");
    }
    Ok(())
}

/// Apply the context bound to the current repository
pub fn apply(paths: &Paths, ui: &Ui) -> Result<()> {
    let root = repo::repo_root()?.context("Not inside a git repository")?;

    match repo::read_binding(&root)? {
        Some(name) => use_context(paths, &name, ui),
        None => bail!(
            "No context bound to this repository.\nHint: Bind one with 'ghctx bind <name>'."
        ),
    }
}

/// Print shell integration code
pub fn shell_hook(shell: HookShell) -> Result<()> {
    print!("{}", shell.snippet());
    Ok(())
}

/// Show gh authentication status for a host
pub fn auth_status(hostname: &str, ui: &Ui) -> Result<()> {
    if !auth::gh_available() {
        bail!(
            "The GitHub CLI ('gh') is not available.\nHint: Install it from https://cli.github.com."
        );
    }

    ui.section(format!("Auth status for {}", hostname));
    ui.newline();

    let status = auth::auth_status(hostname)?;
    ui.println(status.trim_end());
    ui.newline();

    if auth::has_token(hostname) {
        ui.ok(format!("Token present for {}", hostname));
    } else {
        ui.warn(format!("No token for {}", hostname));
    }

    Ok(())
}
