//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Gantry - a proxy build backend for CUDA-suffixed wheels
#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory containing pyproject.toml
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Front-end build settings (repeatable)
    #[arg(
        short = 'C',
        long = "config-setting",
        global = true,
        value_name = "KEY=VALUE"
    )]
    pub config_settings: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the requirements for building a wheel
    GetRequiresForBuildWheel,

    /// Compute the requirements for building a source distribution
    GetRequiresForBuildSdist,

    /// Compute the requirements for building an editable install
    GetRequiresForBuildEditable,

    /// Produce wheel metadata without building
    PrepareMetadataForBuildWheel(MetadataArgs),

    /// Produce editable-install metadata without building
    PrepareMetadataForBuildEditable(MetadataArgs),

    /// Build a wheel
    BuildWheel(BuildArgs),

    /// Build a source distribution
    BuildSdist(SdistArgs),

    /// Build an editable-install wheel
    BuildEditable(BuildArgs),

    /// List the hooks this project's backend stack supports
    Capabilities,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct MetadataArgs {
    /// Directory to create the dist-info directory in
    pub metadata_directory: PathBuf,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Directory to place the built wheel in
    pub wheel_directory: PathBuf,

    /// Previously prepared metadata directory
    #[arg(long)]
    pub metadata_directory: Option<PathBuf>,
}

#[derive(Args)]
pub struct SdistArgs {
    /// Directory to place the built sdist in
    pub sdist_directory: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
