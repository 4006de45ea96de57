//! Completion command
//!
//! Generate shell completion scripts

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

/// Generate shell completion scripts
///
/// Outputs completion script for the specified shell to stdout.
///
/// # Examples
///
/// ```bash
/// # Bash
/// extbuild completion bash > /usr/local/share/bash-completion/completions/extbuild
///
/// # Zsh
/// extbuild completion zsh > /usr/local/share/zsh/site-functions/_extbuild
///
/// # Fish
/// extbuild completion fish > ~/.config/fish/completions/extbuild.fish
/// ```
#[allow(
    clippy::unnecessary_wraps,
    reason = "Result type maintained for consistency with command signature pattern"
)]
pub(crate) fn run(shell: Shell) -> Result<()> {
    let mut cmd = crate::Cli::command();

    generate(shell, &mut cmd, "extbuild", &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_scripts_generate() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
            let mut cmd = crate::Cli::command();
            let mut buffer = Vec::new();
            generate(shell, &mut cmd, "extbuild", &mut buffer);
            let script = String::from_utf8_lossy(&buffer);
            assert!(script.contains("extbuild"), "{shell} script names the binary");
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        crate::Cli::command().debug_assert();
    }
}
