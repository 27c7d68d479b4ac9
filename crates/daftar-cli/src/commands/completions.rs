use clap::CommandFactory;
use clap_complete::{generate, shells};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

pub fn run_completions(shell: CompletionShell) -> Result<(), CliError> {
    let mut command = Cli::command();
    let mut out = std::io::stdout();

    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut command, "daftar", &mut out),
        CompletionShell::Zsh => generate(shells::Zsh, &mut command, "daftar", &mut out),
        CompletionShell::Fish => generate(shells::Fish, &mut command, "daftar", &mut out),
        CompletionShell::Powershell => {
            generate(shells::PowerShell, &mut command, "daftar", &mut out);
        }
        CompletionShell::Elvish => generate(shells::Elvish, &mut command, "daftar", &mut out),
    }
    Ok(())
}
