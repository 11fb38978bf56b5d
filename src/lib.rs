//! Gantry - a proxy build backend for CUDA-suffixed wheels
//!
//! Gantry sits between a packaging front-end and the project's real build
//! backend. Per hook invocation it resolves configuration from the project
//! manifest, the environment, and front-end settings; establishes the CUDA
//! context for the build; rewrites the package name and dependency
//! specifiers for that context; stamps the current git commit into the
//! source tree; and delegates the build itself to the wrapped backend.

pub mod backend;
pub mod core;
pub mod depfile;
pub mod ops;
pub mod util;

/// Test utilities and mocks for gantry unit tests.
///
/// This module is only available when running tests. It provides a mock
/// wrapped backend, a scripted CUDA probe, and project fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    config::{ConfigSettings, EnvSource, MarkerPolicy, ResolvedConfig},
    cuda::CudaContext,
    manifest::Pyproject,
    matrix::BuildMatrix,
    requirement::Requirement,
};

pub use backend::{BuildBackend, CommandBackend, DistKind, Hook};
pub use ops::hooks::{HookEnv, HookOptions};
