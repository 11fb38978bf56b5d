//! Commit stamping.
//!
//! Artifact builds record the source revision by rewriting a
//! `__git_commit__ = "<hex>"` marker line in each configured commit file.
//! Only the marker's value changes; every other byte, including line
//! endings, is preserved. Version information is a convenience: when no
//! git metadata is available the stamper logs and moves on rather than
//! failing the build.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::debug;

use crate::core::config::{MarkerPolicy, ResolvedConfig};

/// One marker line per file; arbitrary surrounding content is preserved.
const MARKER_PATTERN: &str =
    r#"(?m)^(?P<head>\s*__git_commit__\s*=\s*")(?P<hash>[0-9a-fA-F]*)(?P<tail>".*)$"#;

/// Current commit of the repository containing `project_dir`, or `None`
/// when there is no usable git metadata.
pub fn current_commit(project_dir: &Path) -> Option<String> {
    let repo = match git2::Repository::discover(project_dir) {
        Ok(repo) => repo,
        Err(e) => {
            debug!("no git repository at {}: {e}", project_dir.display());
            return None;
        }
    };
    let result = match repo.head().and_then(|head| head.peel_to_commit()) {
        Ok(commit) => Some(commit.id().to_string()),
        Err(e) => {
            debug!("could not resolve HEAD: {e}");
            None
        }
    };
    result
}

/// Stamp the current commit into every configured commit file.
pub fn stamp_commit_files(project_dir: &Path, config: &ResolvedConfig) -> Result<()> {
    let Some(commit) = current_commit(project_dir) else {
        debug!("skipping commit stamping: no revision found");
        return Ok(());
    };

    for file in &config.commit_files {
        let path = project_dir.join(file);
        stamp_file(&path, &commit, config.missing_marker)
            .with_context(|| format!("failed to stamp commit into {}", path.display()))?;
    }
    Ok(())
}

/// Rewrite the marker line in one file. Returns whether the file changed.
///
/// With [`MarkerPolicy::Append`], a file without a marker gains one at the
/// end (and a missing file is created); with [`MarkerPolicy::Skip`] such
/// files are left untouched.
pub fn stamp_file(path: &Path, commit: &str, missing: MarkerPolicy) -> Result<bool> {
    let marker = Regex::new(MARKER_PATTERN)?;

    if !path.exists() {
        return match missing {
            MarkerPolicy::Append => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, marker_line(commit))?;
                Ok(true)
            }
            MarkerPolicy::Skip => Ok(false),
        };
    }

    let contents = fs::read_to_string(path)?;
    let stamped = if marker.is_match(&contents) {
        marker
            .replace_all(&contents, |caps: &Captures| {
                format!("{}{}{}", &caps["head"], commit, &caps["tail"])
            })
            .into_owned()
    } else {
        match missing {
            MarkerPolicy::Append => {
                let mut stamped = contents.clone();
                if !stamped.is_empty() && !stamped.ends_with('\n') {
                    stamped.push('\n');
                }
                stamped.push_str(&marker_line(commit));
                stamped
            }
            MarkerPolicy::Skip => return Ok(false),
        }
    };

    if stamped == contents {
        return Ok(false);
    }
    fs::write(path, stamped)?;
    Ok(true)
}

fn marker_line(commit: &str) -> String {
    format!("__git_commit__ = \"{commit}\"\n")
}
