//! `knife-server exec` — run one command on the server as root.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{RemoteShell, RemoteShellFactory};
use crate::commands::TargetArgs;

/// Arguments for the exec command.
#[derive(Args)]
#[command(trailing_var_arg = true)]
pub struct ExecArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Command and arguments to run on the server
    #[arg(required = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Run a command on the server and print what it printed.
///
/// # Errors
///
/// Returns an error if the server cannot be reached or the command exits
/// non-zero.
pub fn run(app: &AppContext, args: &ExecArgs) -> Result<ExitCode> {
    let connection = args.target.connection(app)?;
    let command = args.command.join(" ");
    let output = app.shell_factory().shell_for(&connection).execute(&command)?;
    app.output.raw(&output);
    Ok(ExitCode::SUCCESS)
}
