//! Wrapped backend invoked as an external command.
//!
//! The backend honors the same subcommand-per-hook contract gantry
//! exposes: requirement hooks print a JSON array on stdout, metadata and
//! artifact hooks print the produced name, and an unknown subcommand exits
//! with status 2. Front-end config settings are forwarded verbatim as
//! repeated `--config-setting` flags.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;

use tracing::debug;

use crate::backend::{BackendError, BuildBackend, DistKind, Hook};
use crate::core::config::ConfigSettings;
use crate::util::process::{find_executable, ProcessBuilder};

/// Exit status a backend uses to signal "hook not provided". This is the
/// conventional usage-error status CLI parsers produce for an unknown
/// subcommand, so plain backends get subset semantics for free.
pub const UNSUPPORTED_HOOK_STATUS: i32 = 2;

/// A wrapped backend run as an external command.
pub struct CommandBackend {
    program: String,
    project_dir: PathBuf,
    settings: Vec<(String, String)>,
}

impl CommandBackend {
    pub fn new(program: &str, project_dir: &Path, settings: &ConfigSettings) -> Self {
        CommandBackend {
            program: program.to_string(),
            project_dir: project_dir.to_path_buf(),
            settings: settings
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }

    /// Resolve the backend command: explicit paths are used as-is, bare
    /// names are looked up on PATH.
    fn resolve_program(&self) -> Result<PathBuf, BackendError> {
        let candidate = Path::new(&self.program);
        if candidate.components().count() > 1 {
            return Ok(candidate.to_path_buf());
        }
        find_executable(&self.program).ok_or_else(|| BackendError::NotFound {
            program: self.program.clone(),
        })
    }

    fn builder(&self, program: &Path, subcommand: &str) -> ProcessBuilder {
        let mut builder = ProcessBuilder::new(program)
            .arg(subcommand)
            .cwd(&self.project_dir);
        for (key, value) in &self.settings {
            builder = builder
                .arg("--config-setting")
                .arg(format!("{key}={value}"));
        }
        builder
    }

    /// Run one hook. `Ok(None)` means the backend does not provide it.
    fn invoke(&self, hook: Hook, args: &[OsString]) -> Result<Option<Output>, BackendError> {
        let program = self.resolve_program()?;
        let builder = self.builder(&program, hook.as_str()).args(args);
        debug!("delegating {hook} to `{}`", builder.display_command());

        let output = builder.exec().map_err(|e| BackendError::Invoke {
            program: self.program.clone(),
            message: format!("{e:#}"),
        })?;

        if output.status.code() == Some(UNSUPPORTED_HOOK_STATUS) {
            debug!("`{}` does not provide {hook}", self.program);
            return Ok(None);
        }
        if !output.status.success() {
            return Err(BackendError::Failed {
                hook,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(Some(output))
    }

    /// The last non-empty stdout line: the produced name.
    fn result_line(&self, hook: Hook, output: &Output) -> Result<String, BackendError> {
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| BackendError::BadOutput {
                program: self.program.clone(),
                hook,
                message: "expected the produced name on stdout".to_string(),
            })
    }
}

impl BuildBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.program
    }

    fn capabilities(&self) -> Result<BTreeSet<Hook>, BackendError> {
        let program = self.resolve_program()?;
        let output = self
            .builder(&program, "capabilities")
            .exec()
            .map_err(|e| BackendError::Invoke {
                program: self.program.clone(),
                message: format!("{e:#}"),
            })?;

        if !output.status.success() {
            // Backends without a capabilities listing are assumed to
            // provide exactly the mandatory artifact hooks.
            debug!(
                "`{}` has no capabilities listing; assuming the mandatory hooks",
                self.program
            );
            return Ok([Hook::BuildSdist, Hook::BuildWheel].into_iter().collect());
        }

        let names: Vec<String> =
            serde_json::from_slice(&output.stdout).map_err(|e| BackendError::Capabilities {
                program: self.program.clone(),
                message: format!("not a JSON array: {e}"),
            })?;
        // Unknown names are ignored so newer backends stay compatible.
        Ok(names.iter().filter_map(|name| Hook::parse(name)).collect())
    }

    fn get_requires(&self, kind: DistKind) -> Result<Option<Vec<String>>, BackendError> {
        let hook = Hook::requires_for(kind);
        match self.invoke(hook, &[])? {
            None => Ok(None),
            Some(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let trimmed = stdout.trim();
                if trimmed.is_empty() {
                    return Ok(Some(Vec::new()));
                }
                serde_json::from_str(trimmed)
                    .map(Some)
                    .map_err(|e| BackendError::BadOutput {
                        program: self.program.clone(),
                        hook,
                        message: format!("expected a JSON array of requirements: {e}"),
                    })
            }
        }
    }

    fn prepare_metadata(
        &self,
        kind: DistKind,
        metadata_dir: &Path,
    ) -> Result<Option<String>, BackendError> {
        let Some(hook) = Hook::prepare_metadata_for(kind) else {
            return Ok(None);
        };
        match self.invoke(hook, &[metadata_dir.as_os_str().to_os_string()])? {
            None => Ok(None),
            Some(output) => self.result_line(hook, &output).map(Some),
        }
    }

    fn build(
        &self,
        kind: DistKind,
        out_dir: &Path,
        metadata_dir: Option<&Path>,
    ) -> Result<Option<String>, BackendError> {
        let hook = Hook::build_for(kind);
        let mut args = vec![out_dir.as_os_str().to_os_string()];
        if let Some(metadata_dir) = metadata_dir {
            args.push(OsString::from("--metadata-directory"));
            args.push(metadata_dir.as_os_str().to_os_string());
        }
        match self.invoke(hook, &args)? {
            None => Ok(None),
            Some(output) => self.result_line(hook, &output).map(Some),
        }
    }
}
