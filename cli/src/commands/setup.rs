//! `knife-server setup` — configure workstation credentials against a
//! freshly bootstrapped standalone server.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{ProgressReporter, RemoteShellFactory};
use crate::application::services::connection_check::verify_connection;
use crate::application::services::platform_detection::{DetectedDistro, detect_distro};
use crate::commands::{ChefArgs, ClientArgs, TargetArgs};
use crate::domain::{BackupSuffix, PlatformError};

/// Arguments for the setup command.
#[derive(Args)]
pub struct SetupArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub chef: ChefArgs,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// Checks SSH access, then installs the validation key, creates the root
/// client and installs the operator's client key.
///
/// # Errors
///
/// Returns the first failing step's error. Earlier steps are not undone.
pub fn run(app: &AppContext, args: &SetupArgs) -> Result<ExitCode> {
    let node_name = args.client.node_name(app)?;
    let client_key = args.client.client_key(app, &node_name);
    let factory = app.shell_factory();
    let reporter = app.reporter();

    let connection = verify_connection(
        &factory,
        args.target.connection(app)?,
        &app.prompt,
        &reporter,
    )?;

    report_platform(
        &reporter,
        detect_distro(&factory.shell_for(&connection), args.chef.server_version(app)),
    )?;

    let credentials = args
        .chef
        .credentials(app, &factory, &connection, &reporter)?;
    let suffix = BackupSuffix::now();
    credentials.install_validation_key(&suffix)?;
    let output = credentials.create_root_client()?;
    app.output.raw(&output);
    credentials.install_client_key(&node_name, &client_key, &suffix)?;

    app.output.success(&format!(
        "Workstation configured for {}",
        connection.display_target()
    ));
    Ok(ExitCode::SUCCESS)
}

/// An unrecognised platform is only a warning; SSH failures still abort.
fn report_platform(
    reporter: &impl ProgressReporter,
    detected: Result<DetectedDistro>,
) -> Result<()> {
    match detected {
        Ok(detected) => reporter.success(&format!(
            "Detected {} {} ({})",
            detected.platform.name, detected.platform.version, detected.distro
        )),
        Err(e) if e.downcast_ref::<PlatformError>().is_some() => {
            reporter.warn(&format!("Could not detect platform: {e}"));
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
