//! Gantry CLI - the proxy build backend's hook entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use gantry::DistKind;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging. Hook results go to stdout, so logs stay on stderr.
    let filter = if cli.verbose {
        EnvFilter::new("gantry=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gantry=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let opts = commands::hook_options(&cli)?;

    // Execute hook
    match cli.command {
        Commands::GetRequiresForBuildWheel => commands::requires::execute(DistKind::Wheel, &opts),
        Commands::GetRequiresForBuildSdist => commands::requires::execute(DistKind::Sdist, &opts),
        Commands::GetRequiresForBuildEditable => {
            commands::requires::execute(DistKind::Editable, &opts)
        }
        Commands::PrepareMetadataForBuildWheel(args) => {
            commands::metadata::execute(DistKind::Wheel, args, &opts)
        }
        Commands::PrepareMetadataForBuildEditable(args) => {
            commands::metadata::execute(DistKind::Editable, args, &opts)
        }
        Commands::BuildWheel(args) => commands::build::execute(DistKind::Wheel, args, &opts),
        Commands::BuildEditable(args) => commands::build::execute(DistKind::Editable, args, &opts),
        Commands::BuildSdist(args) => commands::build::execute_sdist(args, &opts),
        Commands::Capabilities => commands::capabilities::execute(&opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
