//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;
use crate::infra::config::YamlConfigStore;

/// Provision Chef servers over SSH
#[derive(Parser)]
#[command(
    name = "knife-server",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log SSH activity to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a command on the server as root
    Exec(commands::exec::ExecArgs),

    /// Print the bootstrap template for the server's platform
    DetectPlatform(commands::detect_platform::DetectPlatformArgs),

    /// Copy the server's validation key to this workstation
    InstallValidationKey(commands::install_validation_key::InstallValidationKeyArgs),

    /// Create the root client with `knife configure --initial`
    CreateRootClient(commands::create_root_client::CreateRootClientArgs),

    /// Create a client on the server and install its key locally
    InstallClientKey(commands::install_client_key::InstallClientKeyArgs),

    /// Check access, then install every credential in order
    Setup(commands::setup::SetupArgs),
}

impl Cli {
    /// Default log filter for the given `-v` count.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command
    /// fails.
    pub fn run(self) -> Result<ExitCode> {
        let Cli {
            no_color,
            quiet,
            command,
            ..
        } = self;
        let app = AppContext::new(&OutputFlags { no_color, quiet }, &YamlConfigStore)?;
        match command {
            Command::Exec(args) => commands::exec::run(&app, &args),
            Command::DetectPlatform(args) => commands::detect_platform::run(&app, &args),
            Command::InstallValidationKey(args) => {
                commands::install_validation_key::run(&app, &args)
            }
            Command::CreateRootClient(args) => commands::create_root_client::run(&app, &args),
            Command::InstallClientKey(args) => commands::install_client_key::run(&app, &args),
            Command::Setup(args) => commands::setup::run(&app, &args),
        }
    }
}
