//! `gantry prepare-metadata-for-build-*` commands
//!
//! Prints the created dist-info directory name on stdout.

use anyhow::Result;
use gantry::ops::{self, HookOptions};
use gantry::DistKind;

use crate::cli::MetadataArgs;

pub fn execute(kind: DistKind, args: MetadataArgs, opts: &HookOptions) -> Result<()> {
    let dist_info = ops::prepare_metadata(kind, &args.metadata_directory, opts)?;
    println!("{dist_info}");
    Ok(())
}
