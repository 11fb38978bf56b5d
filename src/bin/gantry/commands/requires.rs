//! `gantry get-requires-for-build-*` commands
//!
//! Prints the merged requirement list as a JSON array on stdout.

use anyhow::Result;
use gantry::ops::{self, HookOptions};
use gantry::DistKind;

pub fn execute(kind: DistKind, opts: &HookOptions) -> Result<()> {
    let requires = ops::get_requires(kind, opts)?;
    println!("{}", serde_json::to_string(&requires)?);
    Ok(())
}
