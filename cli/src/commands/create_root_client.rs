//! `knife-server create-root-client` — run `knife configure --initial` on the server.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{ChefArgs, TargetArgs};

/// Arguments for the create-root-client command.
#[derive(Args)]
pub struct CreateRootClientArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub chef: ChefArgs,
}

/// # Errors
///
/// Returns an error if the remote `knife configure` fails.
pub fn run(app: &AppContext, args: &CreateRootClientArgs) -> Result<ExitCode> {
    let connection = args.target.connection(app)?;
    let reporter = app.reporter();
    let credentials = args
        .chef
        .credentials(app, &app.shell_factory(), &connection, &reporter)?;
    let output = credentials.create_root_client()?;
    app.output.raw(&output);
    Ok(ExitCode::SUCCESS)
}
