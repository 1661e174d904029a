//! `knife-server detect-platform` — fingerprint the server's OS.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::RemoteShellFactory;
use crate::application::services::platform_detection::detect_distro;
use crate::commands::TargetArgs;

/// Arguments for the detect-platform command.
#[derive(Args)]
pub struct DetectPlatformArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Chef server major version used in the template name
    #[arg(long, value_name = "VERSION")]
    pub server_version: Option<String>,
}

/// Print the bootstrap template matching the server's platform.
///
/// # Errors
///
/// Returns an error if the server is unreachable or its platform is unknown.
pub fn run(app: &AppContext, args: &DetectPlatformArgs) -> Result<ExitCode> {
    let connection = args.target.connection(app)?;
    let shell = app.shell_factory().shell_for(&connection);
    let version = args
        .server_version
        .as_deref()
        .unwrap_or(&app.config.chef.server_version);
    let detected = detect_distro(&shell, version)?;
    app.output.kv("platform", &detected.platform.name);
    app.output.kv("version", &detected.platform.version);
    app.output.raw(&format!("{}\n", detected.distro));
    Ok(ExitCode::SUCCESS)
}
