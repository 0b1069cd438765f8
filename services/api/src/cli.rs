use crate::commands::{
    run_estimate, run_overrides, run_platforms, run_validate, EstimateArgs, OverridesCommand,
};
use crate::infra::estimation_service;
use crate::server;
use clap::{Args, Parser, Subcommand};
use rom_estimator::config::AppConfig;
use rom_estimator::error::AppError;
use rom_estimator::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ROM Estimator",
    about = "Serve and administer rough order of magnitude migration estimates",
    version
)]
struct Cli {
    /// Directory holding stored configuration overrides (defaults to ROM_OVERRIDES_DIR)
    #[arg(long, global = true)]
    overrides_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Estimate one platform from a JSON answers file
    Estimate(EstimateArgs),
    /// List supported platforms and whether they are overridden
    Platforms,
    /// Report advisory warnings for shipped defaults and stored overrides
    Validate,
    /// Inspect and manage stored configuration overrides
    Overrides {
        #[command(subcommand)]
        command: OverridesCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[arg(skip)]
    pub(crate) overrides_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(mut args) => {
            args.overrides_dir = cli.overrides_dir;
            server::run(args).await
        }
        command => run_offline(command, cli.overrides_dir),
    }
}

fn run_offline(command: Command, overrides_dir: Option<PathBuf>) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = estimation_service(&config.storage, overrides_dir);
    match command {
        Command::Estimate(args) => run_estimate(&service, args),
        Command::Platforms => run_platforms(&service),
        Command::Validate => run_validate(&service),
        Command::Overrides { command } => run_overrides(&service, command),
        Command::Serve(_) => Ok(()),
    }
}
