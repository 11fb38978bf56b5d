//! CUDA toolkit detection.
//!
//! The active CUDA major version decides the package-name suffix and which
//! dependency-matrix branch applies. Detection is layered: the
//! `disable-cuda` option wins outright, an explicit `cuda` matrix axis is
//! trusted next, and only then is the local toolkit probed through `nvcc`.
//! The probe result is never cached across invocations: isolated build and
//! install steps may run in different environments.

use regex::Regex;
use thiserror::Error;

use crate::core::config::ResolvedConfig;
use crate::core::matrix::BuildMatrix;
use crate::util::process::{find_executable, ProcessBuilder};

/// Matrix axis carrying the CUDA version.
pub const CUDA_AXIS: &str = "cuda";

/// Error raised while establishing the CUDA context.
#[derive(Debug, Error)]
pub enum CudaError {
    #[error("matrix axis `cuda` has value `{value}` with no parsable major version")]
    BadAxisValue { value: String },

    #[error(
        "could not determine the CUDA version required by this build\n\
         \n\
         Make sure `nvcc` is on PATH, name the version in the matrix entry\n\
         (`-C matrix-entry=cuda=12`), or set `disable-cuda = true`."
    )]
    Required,
}

/// Whether this build targets a CUDA toolkit, and which major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CudaContext {
    Detected { major: u32 },
    NotTargeted,
}

impl CudaContext {
    /// Package-name suffix for this context (`-cu12`, or empty).
    pub fn suffix(&self) -> String {
        match self {
            CudaContext::Detected { major } => format!("-cu{major}"),
            CudaContext::NotTargeted => String::new(),
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, CudaContext::Detected { .. })
    }
}

/// Probe for a locally installed CUDA toolkit.
///
/// Injected so detection can be scripted in tests and swapped for other
/// toolchain layouts.
pub trait CudaProbe {
    /// Installed toolkit `(major, minor)` version, or `None` when no
    /// toolkit is available.
    fn toolkit_version(&self) -> Option<(u32, u32)>;
}

/// Probes by locating `nvcc` on PATH and parsing `nvcc --version` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NvccProbe;

impl CudaProbe for NvccProbe {
    fn toolkit_version(&self) -> Option<(u32, u32)> {
        let nvcc = find_executable("nvcc")?;
        let output = match ProcessBuilder::new(&nvcc).arg("--version").exec() {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("failed to run {}: {e:#}", nvcc.display());
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!("`nvcc --version` exited with {}", output.status);
            return None;
        }
        parse_release(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract `(major, minor)` from `nvcc --version` output, which reports a
/// line like `Cuda compilation tools, release 12.3, V12.3.107`.
fn parse_release(output: &str) -> Option<(u32, u32)> {
    let pattern = Regex::new(r"release (\d+)\.(\d+)").ok()?;
    let caps = pattern.captures(output)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Establish the CUDA context for one invocation.
pub fn detect(
    config: &ResolvedConfig,
    matrix: &BuildMatrix,
    probe: &dyn CudaProbe,
) -> Result<CudaContext, CudaError> {
    if config.disable_cuda {
        return Ok(CudaContext::NotTargeted);
    }

    if let Some(value) = matrix.get(CUDA_AXIS) {
        let major_str = value.split('.').next().unwrap_or_default();
        return match major_str.parse::<u32>() {
            Ok(major) => Ok(CudaContext::Detected { major }),
            Err(_) => Err(CudaError::BadAxisValue {
                value: value.to_string(),
            }),
        };
    }

    if let Some((major, minor)) = probe.toolkit_version() {
        tracing::debug!("detected CUDA toolkit {major}.{minor}");
        return Ok(CudaContext::Detected { major });
    }

    if config.require_cuda {
        Err(CudaError::Required)
    } else {
        Ok(CudaContext::NotTargeted)
    }
}
