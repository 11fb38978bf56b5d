//! Requirement specifiers and CUDA-aware rewriting.
//!
//! A specifier is treated as a package name, optional extras, and an opaque
//! trailing constraint (version specifiers and/or an environment marker).
//! Rewriting is a pure, order-preserving map: names of wheels published per
//! CUDA version gain the `-cu{major}` suffix, and unpinned specifiers of
//! registry-managed wheels gain a pre-release floor so nightly channels can
//! satisfy them.

use std::fmt;

use thiserror::Error;

use crate::core::cuda::CudaContext;

/// Floor appended to unpinned specifiers of managed wheels so pre-release
/// builds are acceptable candidates.
pub const PRERELEASE_FLOOR: &str = ">=0.0.0a0";

#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("invalid requirement specifier `{spec}`")]
    Invalid { spec: String },
}

/// How a package participates in the CUDA naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixPolicy {
    /// Published once per CUDA major version under a suffixed name.
    Versioned,
    /// Published under a single name, but released on the nightly channel.
    Unversioned,
    /// Not part of the convention; passed through untouched.
    NotManaged,
}

/// Registry of wheels participating in the naming convention.
///
/// Injected into the rewriter so the policy source can be swapped in tests
/// or replaced wholesale without touching the rewriting rules.
pub trait WheelRegistry {
    fn policy(&self, name: &str) -> SuffixPolicy;
}

/// A dependency specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    /// Bracketed extras, including the brackets (`[dask]`).
    pub extras: Option<String>,
    /// Everything after the name and extras, untouched except for trimming.
    pub constraint: String,
}

impl Requirement {
    pub fn parse(spec: &str) -> Result<Self, RequirementError> {
        let spec = spec.trim();
        let name_len = spec
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
            .count();
        if name_len == 0 {
            return Err(RequirementError::Invalid {
                spec: spec.to_string(),
            });
        }
        let name = spec[..name_len].to_string();
        let mut rest = &spec[name_len..];

        let extras = if rest.starts_with('[') {
            match rest.find(']') {
                Some(end) => {
                    let extras = rest[..=end].to_string();
                    rest = &rest[end + 1..];
                    Some(extras)
                }
                None => {
                    return Err(RequirementError::Invalid {
                        spec: spec.to_string(),
                    })
                }
            }
        } else {
            None
        };

        Ok(Requirement {
            name,
            extras,
            constraint: rest.trim().to_string(),
        })
    }

    /// The constraint split into its version part and environment marker.
    fn split_marker(&self) -> (&str, Option<&str>) {
        match self.constraint.split_once(';') {
            Some((version, marker)) => (version.trim(), Some(marker.trim())),
            None => (self.constraint.as_str(), None),
        }
    }

    /// Whether the specifier pins a version (or a direct reference) ahead
    /// of any environment marker.
    pub fn has_version_constraint(&self) -> bool {
        !self.split_marker().0.is_empty()
    }

    /// Copy of this requirement with the pre-release floor as its version
    /// constraint, keeping any environment marker.
    fn with_floor(&self) -> Requirement {
        let (_, marker) = self.split_marker();
        let constraint = match marker {
            Some(marker) => format!("{PRERELEASE_FLOOR}; {marker}"),
            None => PRERELEASE_FLOOR.to_string(),
        };
        Requirement {
            constraint,
            ..self.clone()
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(extras) = &self.extras {
            write!(f, "{extras}")?;
        }
        if !self.constraint.is_empty() {
            if self.constraint.starts_with(';') {
                write!(f, " {}", self.constraint)?;
            } else {
                write!(f, "{}", self.constraint)?;
            }
        }
        Ok(())
    }
}

/// Append the context suffix to a package name.
pub fn rewrite_name(name: &str, context: &CudaContext) -> String {
    format!("{name}{}", context.suffix())
}

/// Rewrite one specifier for the target context.
///
/// When CUDA is not targeted, or the package is not in the registry, the
/// specifier is returned unchanged. An existing version pin is always
/// preserved; the pre-release floor is only added to unpinned specifiers
/// and only when pre-release channels are allowed.
pub fn rewrite_requirement(
    req: &Requirement,
    context: &CudaContext,
    registry: &dyn WheelRegistry,
    only_release: bool,
) -> Requirement {
    if !context.is_detected() {
        return req.clone();
    }
    let policy = registry.policy(&req.name);
    if policy == SuffixPolicy::NotManaged {
        return req.clone();
    }

    let mut out = req.clone();
    if policy == SuffixPolicy::Versioned {
        out.name = rewrite_name(&req.name, context);
    }
    if !only_release && !out.has_version_constraint() {
        out = out.with_floor();
    }
    out
}

/// Rewrite a sequence of specifier strings, preserving order. No
/// deduplication happens here; callers that merge lists decide that.
pub fn rewrite_all(
    specs: &[String],
    context: &CudaContext,
    registry: &dyn WheelRegistry,
    only_release: bool,
) -> Result<Vec<String>, RequirementError> {
    specs
        .iter()
        .map(|spec| {
            Requirement::parse(spec)
                .map(|req| rewrite_requirement(&req, context, registry, only_release).to_string())
        })
        .collect()
}
