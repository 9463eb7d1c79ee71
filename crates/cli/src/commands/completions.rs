//! completions command - Print a shell completion script for s3u

use clap::CommandFactory;
use clap_complete::Shell;

use super::Cli;
use crate::exit_code::ExitCode;

/// Arguments for the completions command
#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print the completion script to stdout
pub fn execute(args: CompletionsArgs) -> ExitCode {
    print!("{}", render(args.shell));
    ExitCode::Success
}

/// Completion script covering every subcommand and global flag
fn render(shell: Shell) -> String {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, name, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
