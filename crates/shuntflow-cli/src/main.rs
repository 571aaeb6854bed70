mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shuntflow", about = "Hemodynamic analysis of colour-flow recordings")]
#[command(version)]
struct Cli {
    /// Log verbosity: -v for info, -vv for debug. RUST_LOG overrides it.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recording and report sector indices and stenosis grade
    Analyze(commands::analyze::AnalyzeArgs),
    /// Print, save or check a session config (TOML)
    Config(commands::config::ConfigArgs),
    /// Show frame source metadata
    Info(commands::info::InfoArgs),
}

fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
