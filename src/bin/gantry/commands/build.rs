//! `gantry build-*` commands
//!
//! Prints the produced artifact's file name on stdout.

use anyhow::Result;
use gantry::ops::{self, HookOptions};
use gantry::DistKind;

use crate::cli::{BuildArgs, SdistArgs};

pub fn execute(kind: DistKind, args: BuildArgs, opts: &HookOptions) -> Result<()> {
    let artifact = ops::build(
        kind,
        &args.wheel_directory,
        args.metadata_directory.as_deref(),
        opts,
    )?;
    println!("{artifact}");
    Ok(())
}

pub fn execute_sdist(args: SdistArgs, opts: &HookOptions) -> Result<()> {
    let artifact = ops::build(DistKind::Sdist, &args.sdist_directory, None, opts)?;
    println!("{artifact}");
    Ok(())
}
