use crate::commands::{run_inspect, run_rank, InspectArgs, RankArgs};
use clap::{Parser, Subcommand};
use cohort_rank::{telemetry, AppConfig, AppError};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "cohort-rank",
    about = "Merge, rebase and rank student score sheets with no fixed schema",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score and rank a sheet, writing a JSON report or a summary
    Rank(RankArgs),
    /// Show the identity field and subjects inferred for a sheet
    Inspect(InspectArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    debug!(environment = ?config.environment, "configuration loaded");

    match cli.command {
        Command::Rank(args) => run_rank(args, config.pipeline).await,
        Command::Inspect(args) => run_inspect(args, &config.pipeline),
    }
}
