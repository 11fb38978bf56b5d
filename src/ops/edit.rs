//! Scoped rewriting of the project manifest.
//!
//! The wrapped backend reads `pyproject.toml` itself, so the suffixed name
//! and the resolved dependency set have to be on disk while the delegated
//! hook runs. The guard swaps the rewritten manifest in and restores the
//! original bytes on drop, whether or not the hook succeeded. Restoration
//! is a rename of the untouched backup, never a re-serialization, so the
//! user's formatting survives.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error};

use crate::core::manifest::PYPROJECT;

/// Backup name; dotted so source-distribution globs do not pick it up.
const BACKUP: &str = ".pyproject.toml.gantry.bak";

/// Holds the rewritten manifest in place until dropped.
#[must_use = "dropping the guard restores the original manifest"]
pub struct ManifestGuard {
    path: PathBuf,
    backup: PathBuf,
}

impl ManifestGuard {
    /// Back up the manifest and put `rewritten` in its place.
    pub fn apply(project_dir: &Path, rewritten: &str) -> Result<Self> {
        let path = project_dir.join(PYPROJECT);
        let backup = project_dir.join(BACKUP);

        fs::rename(&path, &backup)
            .with_context(|| format!("failed to back up {}", path.display()))?;

        // Write-then-persist so a crash mid-write cannot leave a truncated
        // manifest next to the backup.
        let result = (|| -> Result<()> {
            let mut file = tempfile::NamedTempFile::new_in(project_dir)
                .context("failed to create temporary manifest")?;
            file.write_all(rewritten.as_bytes())?;
            file.persist(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(())
        })();

        if let Err(e) = result {
            // Put the original back before surfacing the failure.
            if let Err(restore) = fs::rename(&backup, &path) {
                error!("failed to restore {}: {restore}", path.display());
            }
            return Err(e);
        }

        debug!("rewrote {} for the build", path.display());
        Ok(ManifestGuard { path, backup })
    }
}

impl Drop for ManifestGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::rename(&self.backup, &self.path) {
            error!(
                "failed to restore {} from {}: {e}",
                self.path.display(),
                self.backup.display()
            );
        }
    }
}
