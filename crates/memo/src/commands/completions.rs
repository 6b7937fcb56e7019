//! Shell completions command implementation.
//!
//! Generate shell completions for bash, zsh, fish, and powershell.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell as ClapShell};

use crate::cli::{Cli, Shell};

/// Generate shell completions for the given shell and write to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn execute(shell: &Shell) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write_completions(shell, &mut stdout)?;
    stdout.flush()
}

/// Writes the completion script for `shell` to `out`.
pub fn write_completions(shell: &Shell, out: &mut impl Write) -> io::Result<()> {
    let mut cmd = Cli::command();
    generate(clap_shell(shell), &mut cmd, "memo", out);
    Ok(())
}

fn clap_shell(shell: &Shell) -> ClapShell {
    match shell {
        Shell::Bash => ClapShell::Bash,
        Shell::Zsh => ClapShell::Zsh,
        Shell::Fish => ClapShell::Fish,
        Shell::Powershell => ClapShell::PowerShell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completions(shell: Shell) -> String {
        let mut buffer = Vec::new();
        write_completions(&shell, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_bash_completions() {
        let script = completions(Shell::Bash);
        assert!(script.contains("_memo"));
        assert!(script.contains("filter"));
    }

    #[test]
    fn test_zsh_completions() {
        assert!(completions(Shell::Zsh).contains("#compdef memo"));
    }

    #[test]
    fn test_fish_completions() {
        assert!(completions(Shell::Fish).contains("complete -c memo"));
    }

    #[test]
    fn test_powershell_completions() {
        assert!(completions(Shell::Powershell).contains("memo"));
    }
}
