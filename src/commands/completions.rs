//! # Completions Command Implementation
//!
//! Prints a completion script for `repo-fleet` on stdout. It needs neither a
//! token nor a config file, so it runs before any [`super::Context`] exists.
//!
//! ```bash
//! repo-fleet completions bash > ~/.local/share/bash-completion/completions/repo-fleet
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_script(args.shell, &mut io::stdout());
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_covers_global_flags_and_subcommands() {
        let mut out = Vec::new();
        write_script(Shell::Fish, &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("complete -c repo-fleet"));
        assert!(script.contains("skip-forks"));
        assert!(script.contains("fail-on-error"));
        assert!(script.contains("mailmap"));
    }
}
