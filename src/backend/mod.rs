//! The wrapped-backend contract.
//!
//! The hook set is the closed, standardized one: three requirement hooks,
//! two metadata hooks, three artifact hooks. Gantry exposes it to the
//! front-end and consumes it from the wrapped backend, which may implement
//! only a subset; absent optional hooks fall back to the standard's
//! documented defaults. Backends implement [`BuildBackend`]; the
//! production implementation invokes an external command honoring the same
//! subcommand-per-hook contract as gantry itself.

mod command;

pub use command::{CommandBackend, UNSUPPORTED_HOOK_STATUS};

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Kind of distribution a hook operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DistKind {
    Sdist,
    Wheel,
    Editable,
}

impl DistKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistKind::Sdist => "sdist",
            DistKind::Wheel => "wheel",
            DistKind::Editable => "editable",
        }
    }
}

impl fmt::Display for DistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation of the standardized build-backend contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hook {
    GetRequiresForBuildSdist,
    GetRequiresForBuildWheel,
    GetRequiresForBuildEditable,
    PrepareMetadataForBuildWheel,
    PrepareMetadataForBuildEditable,
    BuildSdist,
    BuildWheel,
    BuildEditable,
}

impl Hook {
    /// Every hook, in contract order.
    pub const ALL: [Hook; 8] = [
        Hook::GetRequiresForBuildSdist,
        Hook::GetRequiresForBuildWheel,
        Hook::GetRequiresForBuildEditable,
        Hook::PrepareMetadataForBuildWheel,
        Hook::PrepareMetadataForBuildEditable,
        Hook::BuildSdist,
        Hook::BuildWheel,
        Hook::BuildEditable,
    ];

    /// Hooks the proxy provides regardless of the wrapped backend: it
    /// always has requirements of its own to report, and the mandatory
    /// artifact hooks are the backend's to fail, not to omit.
    pub const ALWAYS: [Hook; 4] = [
        Hook::GetRequiresForBuildSdist,
        Hook::GetRequiresForBuildWheel,
        Hook::BuildSdist,
        Hook::BuildWheel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::GetRequiresForBuildSdist => "get-requires-for-build-sdist",
            Hook::GetRequiresForBuildWheel => "get-requires-for-build-wheel",
            Hook::GetRequiresForBuildEditable => "get-requires-for-build-editable",
            Hook::PrepareMetadataForBuildWheel => "prepare-metadata-for-build-wheel",
            Hook::PrepareMetadataForBuildEditable => "prepare-metadata-for-build-editable",
            Hook::BuildSdist => "build-sdist",
            Hook::BuildWheel => "build-wheel",
            Hook::BuildEditable => "build-editable",
        }
    }

    /// Parse a hook name as it appears in a `capabilities` listing.
    pub fn parse(name: &str) -> Option<Hook> {
        Hook::ALL.into_iter().find(|hook| hook.as_str() == name)
    }

    /// The requirement hook for a distribution kind.
    pub fn requires_for(kind: DistKind) -> Hook {
        match kind {
            DistKind::Sdist => Hook::GetRequiresForBuildSdist,
            DistKind::Wheel => Hook::GetRequiresForBuildWheel,
            DistKind::Editable => Hook::GetRequiresForBuildEditable,
        }
    }

    /// The metadata hook for a distribution kind; sdists have none.
    pub fn prepare_metadata_for(kind: DistKind) -> Option<Hook> {
        match kind {
            DistKind::Sdist => None,
            DistKind::Wheel => Some(Hook::PrepareMetadataForBuildWheel),
            DistKind::Editable => Some(Hook::PrepareMetadataForBuildEditable),
        }
    }

    /// The artifact hook for a distribution kind.
    pub fn build_for(kind: DistKind) -> Hook {
        match kind {
            DistKind::Sdist => Hook::BuildSdist,
            DistKind::Wheel => Hook::BuildWheel,
            DistKind::Editable => Hook::BuildEditable,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from the wrapped backend. Propagated to the front-end without
/// retry: build failures are not transient at this layer.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(
        "wrapped backend `{program}` was not found on PATH\n\
         \n\
         Make sure the `build-backend` option in `[tool.gantry]` names an\n\
         installed command."
    )]
    NotFound { program: String },

    #[error("failed to invoke wrapped backend `{program}`: {message}")]
    Invoke { program: String, message: String },

    #[error("wrapped backend hook `{hook}` failed ({status}):\n{stderr}")]
    Failed {
        hook: Hook,
        status: String,
        stderr: String,
    },

    #[error("wrapped backend `{program}` printed unusable output for `{hook}`: {message}")]
    BadOutput {
        program: String,
        hook: Hook,
        message: String,
    },

    #[error("wrapped backend `{program}` printed an unusable capabilities listing: {message}")]
    Capabilities { program: String, message: String },
}

/// Interface to the wrapped build backend.
///
/// `Ok(None)` from an optional hook means the backend does not provide it;
/// callers apply the standard's documented fallback.
pub trait BuildBackend {
    /// Identifier used in log and error messages.
    fn name(&self) -> &str;

    /// The hooks this backend provides.
    fn capabilities(&self) -> Result<BTreeSet<Hook>, BackendError>;

    /// `get-requires-for-build-*`: extra requirements of the backend's own.
    fn get_requires(&self, kind: DistKind) -> Result<Option<Vec<String>>, BackendError>;

    /// `prepare-metadata-for-build-*`: returns the created dist-info
    /// directory name.
    fn prepare_metadata(
        &self,
        kind: DistKind,
        metadata_dir: &Path,
    ) -> Result<Option<String>, BackendError>;

    /// `build-*`: returns the produced artifact's file name.
    fn build(
        &self,
        kind: DistKind,
        out_dir: &Path,
        metadata_dir: Option<&Path>,
    ) -> Result<Option<String>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_names_round_trip() {
        for hook in Hook::ALL {
            assert_eq!(Hook::parse(hook.as_str()), Some(hook));
        }
        assert_eq!(Hook::parse("no-such-hook"), None);
    }

    #[test]
    fn test_hooks_for_kind() {
        assert_eq!(
            Hook::requires_for(DistKind::Wheel),
            Hook::GetRequiresForBuildWheel
        );
        assert_eq!(Hook::prepare_metadata_for(DistKind::Sdist), None);
        assert_eq!(
            Hook::prepare_metadata_for(DistKind::Editable),
            Some(Hook::PrepareMetadataForBuildEditable)
        );
        assert_eq!(Hook::build_for(DistKind::Sdist), Hook::BuildSdist);
    }

    #[test]
    fn test_always_hooks_are_a_subset() {
        for hook in Hook::ALWAYS {
            assert!(Hook::ALL.contains(&hook));
        }
    }
}
