//! Shell integration snippets.
//!
//! Each snippet checks for a `.ghcontext` file at the git repo root on every
//! prompt (or directory change) and runs `ghctx use` when the bound context
//! differs from the active one, as reported by `ghctx current --porcelain`.

use clap::ValueEnum;

/// Shells we can emit integration code for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HookShell {
    Bash,
    Zsh,
    Powershell,
    Pwsh,
    Fish,
}

impl HookShell {
    /// The integration snippet for this shell
    pub fn snippet(&self) -> &'static str {
        match self {
            HookShell::Bash => BASH_HOOK,
            HookShell::Zsh => ZSH_HOOK,
            HookShell::Powershell | HookShell::Pwsh => POWERSHELL_HOOK,
            HookShell::Fish => FISH_HOOK,
        }
    }
}

const BASH_HOOK: &str = r#"# ghctx: auto-apply the bound context when entering a repo with .ghcontext
# Add this to your ~/.bashrc

__ghctx_auto_apply() {
  local root
  root="$(git rev-parse --show-toplevel 2>/dev/null)" || return 0

  if [[ -f "$root/.ghcontext" ]]; then
    local name current
    name="$(cat "$root/.ghcontext")"
    current="$(ghctx current --porcelain 2>/dev/null)"

    if [[ "$current" != "$name" ]]; then
      echo "switching gh context: $name"
      ghctx use "$name" >/dev/null 2>&1 || true
    fi
  fi
}

PROMPT_COMMAND="__ghctx_auto_apply${PROMPT_COMMAND:+;$PROMPT_COMMAND}"
"#;

const ZSH_HOOK: &str = r#"# ghctx: auto-apply the bound context when entering a repo with .ghcontext
# Add this to your ~/.zshrc

__ghctx_auto_apply() {
  local root
  root="$(git rev-parse --show-toplevel 2>/dev/null)" || return 0

  if [[ -f "$root/.ghcontext" ]]; then
    local name current
    name="$(cat "$root/.ghcontext")"
    current="$(ghctx current --porcelain 2>/dev/null)"

    if [[ "$current" != "$name" ]]; then
      echo "switching gh context: $name"
      ghctx use "$name" >/dev/null 2>&1 || true
    fi
  fi
}

autoload -U add-zsh-hook
add-zsh-hook precmd __ghctx_auto_apply
"#;

const POWERSHELL_HOOK: &str = r#"# ghctx: auto-apply the bound context when entering a repo with .ghcontext
# Add this to your PowerShell profile ($PROFILE)

function Invoke-GhctxAutoApply {
    $root = git rev-parse --show-toplevel 2>$null
    if (-not $root) { return }

    $bindingFile = Join-Path $root ".ghcontext"
    if (Test-Path $bindingFile) {
        $name = (Get-Content $bindingFile -Raw).Trim()
        $current = ghctx current --porcelain 2>$null

        if ($current -ne $name) {
            Write-Host "switching gh context: $name"
            ghctx use $name *> $null
        }
    }
}

$__ghctxOriginalPrompt = $function:prompt
function prompt {
    Invoke-GhctxAutoApply
    & $__ghctxOriginalPrompt
}
"#;

const FISH_HOOK: &str = r#"# ghctx: auto-apply the bound context when entering a repo with .ghcontext
# Add this to your ~/.config/fish/config.fish

function __ghctx_auto_apply --on-variable PWD
    set -l root (git rev-parse --show-toplevel 2>/dev/null)
    if test -z "$root"
        return
    end

    set -l binding_file "$root/.ghcontext"
    if test -f $binding_file
        set -l name (cat $binding_file | string trim)
        set -l current (ghctx current --porcelain 2>/dev/null)

        if test "$current" != "$name"
            echo "switching gh context: $name"
            ghctx use $name >/dev/null 2>&1
        end
    end
end
"#;
