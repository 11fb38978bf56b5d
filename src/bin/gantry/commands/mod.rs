//! Hook subcommand implementations.

pub mod build;
pub mod capabilities;
pub mod completions;
pub mod metadata;
pub mod requires;

use anyhow::{anyhow, Result};
use gantry::core::config::ConfigSettings;
use gantry::ops::HookOptions;

use crate::cli::Cli;

/// Build per-invocation hook options from the global CLI flags.
pub fn hook_options(cli: &Cli) -> Result<HookOptions> {
    let mut settings = ConfigSettings::new();
    for raw in &cli.config_settings {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid config setting `{raw}` (expected KEY=VALUE)"))?;
        settings.insert(key.to_string(), value.to_string());
    }
    Ok(HookOptions {
        project_dir: cli.project_dir.clone(),
        settings,
    })
}
