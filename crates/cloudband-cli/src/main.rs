mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudband", about = "Cloud band detection and tracking in OLR fields")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or save the default detection parameters as TOML
    Config(commands::config::ConfigArgs),
    /// Detect and track cloud bands in a field bundle
    Detect(commands::detect::DetectArgs),
    /// Compute cloud band density from an archive
    Density(commands::density::DensityArgs),
    /// Show the content of a cloud band archive
    Info(commands::info::InfoArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Config(args) => commands::config::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Density(args) => commands::density::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
