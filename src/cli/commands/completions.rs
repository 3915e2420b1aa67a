//! `commvault completions <shell>` — print a shell completion script.
//!
//!   commvault completions bash > ~/.local/share/bash-completion/completions/commvault
//!   commvault completions zsh > "${fpath[1]}/_commvault"

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut out = io::stdout().lock();
    write_script(shell, &mut out);
    out.flush()?;
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}
