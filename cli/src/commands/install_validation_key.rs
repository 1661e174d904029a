//! `knife-server install-validation-key` — copy the validator key locally.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{ChefArgs, TargetArgs};
use crate::domain::BackupSuffix;

/// Arguments for the install-validation-key command.
#[derive(Args)]
pub struct InstallValidationKeyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub chef: ChefArgs,
}

/// # Errors
///
/// Returns an error if the key cannot be fetched or written.
pub fn run(app: &AppContext, args: &InstallValidationKeyArgs) -> Result<ExitCode> {
    let connection = args.target.connection(app)?;
    let reporter = app.reporter();
    let credentials = args
        .chef
        .credentials(app, &app.shell_factory(), &connection, &reporter)?;
    credentials.install_validation_key(&BackupSuffix::now())?;
    Ok(ExitCode::SUCCESS)
}
