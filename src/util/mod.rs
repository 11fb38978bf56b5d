//! Shared utilities

pub mod process;

pub use process::{find_executable, ProcessBuilder};
