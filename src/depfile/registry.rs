//! Built-in registry of wheels that participate in the CUDA naming
//! convention.
//!
//! The registry is static data: which wheels are published per CUDA major
//! version under a suffixed name, and which ship a single name but release
//! on the nightly channel. Everything else passes through the rewriter
//! untouched.

use crate::core::requirement::{SuffixPolicy, WheelRegistry};

/// Wheels published per CUDA major version under a suffixed name.
const VERSIONED_WHEELS: &[&str] = &[
    "cucim",
    "cudf",
    "cugraph",
    "cugraph-dgl",
    "cugraph-equivariant",
    "cugraph-pyg",
    "cuml",
    "cuproj",
    "cuspatial",
    "cuxfilter",
    "dask-cudf",
    "distributed-ucxx",
    "nx-cugraph",
    "pylibcugraph",
    "pylibcugraphops",
    "pylibraft",
    "pylibwholegraph",
    "pynvjitlink",
    "raft-dask",
    "rmm",
    "ucx-py",
    "ucxx",
];

/// Wheels published under a single name but released on the nightly
/// channel alongside the versioned ones.
const UNVERSIONED_WHEELS: &[&str] = &["dask-cuda", "rapids-dask-dependency"];

/// The static, built-in wheel registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownWheels;

impl WheelRegistry for KnownWheels {
    fn policy(&self, name: &str) -> SuffixPolicy {
        if VERSIONED_WHEELS.contains(&name) {
            SuffixPolicy::Versioned
        } else if UNVERSIONED_WHEELS.contains(&name) {
            SuffixPolicy::Unversioned
        } else {
            SuffixPolicy::NotManaged
        }
    }
}
