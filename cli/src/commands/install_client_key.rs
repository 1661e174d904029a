//! `knife-server install-client-key` — create a Chef client and install its key.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{ChefArgs, ClientArgs, TargetArgs};
use crate::domain::BackupSuffix;

/// Arguments for the install-client-key command.
#[derive(Args)]
pub struct InstallClientKeyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub chef: ChefArgs,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// # Errors
///
/// Returns an error if no client name is configured, or if account creation
/// or the key install fails.
pub fn run(app: &AppContext, args: &InstallClientKeyArgs) -> Result<ExitCode> {
    let node_name = args.client.node_name(app)?;
    let client_key = args.client.client_key(app, &node_name);
    let connection = args.target.connection(app)?;
    let reporter = app.reporter();
    let credentials = args
        .chef
        .credentials(app, &app.shell_factory(), &connection, &reporter)?;
    credentials.install_client_key(&node_name, &client_key, &BackupSuffix::now())?;
    Ok(ExitCode::SUCCESS)
}
