use crate::commands::{
    run_dataset, run_regions, run_report, run_view, DatasetArgs, RegionsArgs, ReportArgs, ViewArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use property_explorer::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Adelaide Property Market Explorer",
    about = "Explore suburb prices, growth, demographics, crime, rents and forecasts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Search region names
    Regions(RegionsArgs),
    /// Print one tab of a region's dashboard
    View(ViewArgs),
    /// Write a PDF or DOCX report for a region
    Report(ReportArgs),
    /// Show which data tables loaded
    Dataset(DatasetArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Regions(args) => run_regions(args),
        Command::View(args) => run_view(args),
        Command::Report(args) => run_report(args),
        Command::Dataset(args) => run_dataset(args),
    }
}
