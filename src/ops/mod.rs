//! High-level operations.
//!
//! This module implements the hook pipelines the CLI exposes and their
//! side effects: the scoped manifest rewrite and commit stamping.

pub mod edit;
pub mod hooks;
pub mod stamp;

pub use hooks::{
    build, capabilities, get_requires, prepare_metadata, HookEnv, HookOptions,
};
