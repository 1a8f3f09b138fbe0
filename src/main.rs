use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use ghctx::{
    commands,
    paths::Paths,
    shell_hook::HookShell,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "ghctx")]
#[command(about = "kubectx-style context switcher for the GitHub CLI")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all saved contexts
    List,

    /// Show the active context and its SSH key status
    Current {
        /// Machine-readable output for shell prompts
        #[arg(long)]
        porcelain: bool,
    },

    /// Create a new context
    New {
        /// Name of the context to create
        name: String,

        /// GitHub account login (prompted if omitted)
        #[arg(long)]
        user: Option<String>,

        /// GitHub host (github.com or an enterprise instance)
        #[arg(long, default_value = "github.com")]
        host: String,

        /// SSH private key to activate with this context
        #[arg(long, value_name = "PATH")]
        ssh_key: Option<String>,
    },

    /// Switch to a context (activate it)
    Use {
        /// Name of the context to activate
        name: String,
    },

    /// Delete a context
    Delete {
        /// Name of the context to delete
        name: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Bind a context to the current git repository
    Bind {
        /// Context name (defaults to the active context)
        name: Option<String>,
    },

    /// Remove the current repository's context binding
    Unbind,

    /// Apply the context bound to the current repository
    Apply,

    /// Print shell snippet for auto-apply on cd
    ShellHook {
        /// Target shell
        #[arg(value_enum, default_value = "bash")]
        shell: HookShell,
    },

    /// Show gh authentication status for a host
    AuthStatus {
        /// Host to inspect
        #[arg(long, default_value = "github.com")]
        hostname: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = Paths::new()?;
    let ui = Ui::new(cli.color, cli.no_color);

    match cli.command {
        Commands::List => commands::list(&paths, &ui),
        Commands::Current { porcelain } => commands::current(&paths, &ui, porcelain),
        Commands::New {
            name,
            user,
            host,
            ssh_key,
        } => commands::new(&paths, &name, user, host, ssh_key, &ui),
        Commands::Use { name } => commands::use_context(&paths, &name, &ui),
        Commands::Delete { name, force } => commands::delete(&paths, &name, force, &ui),
        Commands::Bind { name } => commands::bind(&paths, name.as_deref(), &ui),
        Commands::Unbind => commands::unbind(&ui),
        Commands::Apply => commands::apply(&paths, &ui),
        Commands::ShellHook { shell } => commands::shell_hook(shell),
        Commands::AuthStatus { hostname } => commands::auth_status(&hostname, &ui),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "ghctx", &mut std::io::stdout());
            Ok(())
        }
    }
}
