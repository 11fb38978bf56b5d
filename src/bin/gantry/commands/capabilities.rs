//! `gantry capabilities` command
//!
//! Prints the supported hook names as a JSON array on stdout, so a
//! front-end (or an outer gantry) can discover which optional hooks the
//! backend stack provides.

use anyhow::Result;
use gantry::ops::{self, HookOptions};

pub fn execute(opts: &HookOptions) -> Result<()> {
    let hooks = ops::capabilities(opts)?;
    let names: Vec<&str> = hooks.iter().map(|hook| hook.as_str()).collect();
    println!("{}", serde_json::to_string(&names)?);
    Ok(())
}
