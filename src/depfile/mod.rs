//! Dependency-declaration file loading and matrix-driven resolution.
//!
//! Projects declare their dependency sets once, in `dependencies.yaml`,
//! keyed by requirement category. Each category carries a `common` list
//! that always applies plus `specific` branches selected by build-matrix
//! axes; a branch with an empty (or omitted) matrix is the unconditional
//! fallback. Resolution preserves declaration order so repeated builds see
//! identical lists.
//!
//! ```yaml
//! build:
//!   common: ["cmake>=3.26.4", "ninja"]
//! run:
//!   common: ["numpy"]
//!   specific:
//!     - matrix: { cuda: "12" }
//!       packages: ["rmm>=24.0"]
//!     - matrix: {}
//!       packages: ["rmm"]
//! ```

pub mod registry;

pub use registry::KnownWheels;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::matrix::BuildMatrix;

/// Requirement categories a declaration file can be resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    /// Tools needed to run the build itself.
    Build,
    /// Libraries the build compiles and links against.
    Host,
    /// Runtime dependencies of the built package.
    Run,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::Build => "build",
            RequirementKind::Host => "host",
            RequirementKind::Run => "run",
        }
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while loading or resolving the declaration file.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read dependency declarations from {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dependency declarations in {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "no `{kind}` dependency branch matches build matrix `{matrix}` \
         and no unconditional fallback is declared"
    )]
    NoMatchingBranch { kind: RequirementKind, matrix: String },
}

/// One conditional dependency branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixBranch {
    /// Axes this branch applies to; empty or omitted matches any matrix.
    #[serde(default)]
    pub matrix: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub packages: Vec<String>,
}

impl MatrixBranch {
    fn matches(&self, matrix: &BuildMatrix) -> bool {
        match &self.matrix {
            None => true,
            Some(axes) => axes
                .iter()
                .all(|(axis, value)| matrix.get(axis) == Some(value.as_str())),
        }
    }
}

/// One requirement category's declarations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DependencySet {
    pub common: Vec<String>,
    pub specific: Vec<MatrixBranch>,
}

/// A parsed dependency-declaration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DependencyFile {
    sets: BTreeMap<String, DependencySet>,
}

/// Load a declaration file from disk.
pub fn load(path: &Path) -> Result<DependencyFile, ResolveError> {
    let contents = fs::read_to_string(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ResolveError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl DependencyFile {
    /// Resolve one category against the build matrix: the `common` list
    /// followed by the first matching `specific` branch. A category absent
    /// from the file resolves to an empty list; a matrix no branch covers
    /// is an error.
    pub fn resolve(
        &self,
        kind: RequirementKind,
        matrix: &BuildMatrix,
    ) -> Result<Vec<String>, ResolveError> {
        let Some(set) = self.sets.get(kind.as_str()) else {
            return Ok(Vec::new());
        };

        let mut packages = set.common.clone();
        if !set.specific.is_empty() {
            let branch = set
                .specific
                .iter()
                .find(|branch| branch.matches(matrix))
                .ok_or_else(|| ResolveError::NoMatchingBranch {
                    kind,
                    matrix: matrix.entry(),
                })?;
            packages.extend(branch.packages.iter().cloned());
        }
        Ok(packages)
    }
}
