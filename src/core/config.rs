//! Build configuration resolution.
//!
//! Options come from three sources, highest precedence first:
//! 1. Front-end config settings (`-C key=value`)
//! 2. `GANTRY_*` environment variables
//! 3. The `[tool.gantry]` table in `pyproject.toml`
//!
//! with a built-in default as the last resort. Only a declared subset of
//! options may be overridden per build; the rest are fixed when the source
//! tree is authored. Resolution is a pure function over three immutable
//! maps and runs once per hook invocation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::core::manifest::Pyproject;

/// Prefix for environment-variable overrides (`GANTRY_DISABLE_CUDA`, ...).
pub const ENV_PREFIX: &str = "GANTRY_";

/// Dynamic build settings passed by the front-end (`-C key=value`).
///
/// Keys naming a gantry option override it; all other keys belong to the
/// wrapped backend and are forwarded verbatim.
pub type ConfigSettings = BTreeMap<String, String>;

/// Error raised during configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no `[tool.gantry]` table in pyproject.toml")]
    MissingTable,

    #[error("missing required option `{option}` in `[tool.gantry]`")]
    MissingOption { option: &'static str },

    #[error("unknown environment variable `{var}` (no such gantry option)")]
    UnknownEnvVar { var: String },

    #[error("option `{option}` is fixed in `[tool.gantry]` and cannot be overridden via {origin}")]
    NotOverridable {
        option: String,
        origin: &'static str,
    },

    #[error("option `{option}` must be `true` or `false`, not `{value}`")]
    BadBool { option: String, value: String },
}

/// Behavior when a commit file has no marker line to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPolicy {
    /// Append a fresh marker line (creating the file if needed).
    #[default]
    Append,
    /// Leave the file untouched.
    Skip,
}

/// The raw `[tool.gantry]` table as authored in `pyproject.toml`.
///
/// Unknown keys are rejected at parse time so a typo'd option fails the
/// build instead of silently using a default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct GantryTable {
    pub build_backend: Option<String>,
    pub requires: Vec<String>,
    pub commit_files: Option<Vec<PathBuf>>,
    pub missing_marker: Option<MarkerPolicy>,
    pub dependencies_file: Option<PathBuf>,
    pub disable_cuda: Option<bool>,
    pub require_cuda: Option<bool>,
    pub matrix_entry: Option<String>,
    pub only_release_deps: Option<bool>,
}

/// Snapshot of the `GANTRY_*` environment variables for one invocation.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }

    fn get(&self, var: &str) -> Option<&str> {
        self.vars.get(var).map(String::as_str)
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for EnvSource {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        EnvSource {
            vars: iter.into_iter().collect(),
        }
    }
}

/// One recognized option: its manifest key and whether the environment and
/// config settings may override it.
struct OptionSpec {
    key: &'static str,
    overridable: bool,
}

const OPTIONS: &[OptionSpec] = &[
    OptionSpec { key: "build-backend", overridable: false },
    OptionSpec { key: "requires", overridable: false },
    OptionSpec { key: "commit-files", overridable: false },
    OptionSpec { key: "missing-marker", overridable: false },
    OptionSpec { key: "dependencies-file", overridable: true },
    OptionSpec { key: "disable-cuda", overridable: true },
    OptionSpec { key: "require-cuda", overridable: true },
    OptionSpec { key: "matrix-entry", overridable: true },
    OptionSpec { key: "only-release-deps", overridable: true },
];

fn option_spec(key: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.key == key)
}

/// Environment variable carrying an override for `option`.
fn env_var_name(option: &str) -> String {
    format!("{ENV_PREFIX}{}", option.to_uppercase().replace('-', "_"))
}

/// The fully resolved build configuration for one hook invocation.
///
/// Immutable after construction; the hook proxy owns it and lends it by
/// reference to every other component.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Command implementing the wrapped build backend.
    pub build_backend: String,

    /// Extra build requirements merged into the requirement hooks' output.
    pub requires: Vec<String>,

    /// Files whose commit marker is rewritten before artifact builds,
    /// relative to the project root.
    pub commit_files: Vec<PathBuf>,

    /// Behavior when a commit file has no marker line.
    pub missing_marker: MarkerPolicy,

    /// Dependency-declaration file, relative to the project root.
    pub dependencies_file: PathBuf,

    /// Skip CUDA detection and leave all metadata unsuffixed.
    pub disable_cuda: bool,

    /// Fail the build when no CUDA version can be determined.
    pub require_cuda: bool,

    /// Build matrix entry (`axis=value;axis=value`).
    pub matrix_entry: String,

    /// Restrict dependency rewriting to release versions (no pre-release
    /// floor on unpinned specifiers).
    pub only_release_deps: bool,
}

impl ResolvedConfig {
    /// Resolve every option from the three sources.
    pub fn resolve(
        pyproject: &Pyproject,
        env: &EnvSource,
        settings: &ConfigSettings,
    ) -> Result<Self, ConfigError> {
        let table = pyproject.gantry.as_ref().ok_or(ConfigError::MissingTable)?;

        validate_sources(env, settings)?;

        Ok(ResolvedConfig {
            build_backend: table
                .build_backend
                .clone()
                .ok_or(ConfigError::MissingOption { option: "build-backend" })?,
            requires: table.requires.clone(),
            commit_files: table
                .commit_files
                .clone()
                .unwrap_or_else(|| vec![default_commit_file(pyproject)]),
            missing_marker: table.missing_marker.unwrap_or_default(),
            dependencies_file: override_string("dependencies-file", env, settings)
                .map(PathBuf::from)
                .or_else(|| table.dependencies_file.clone())
                .unwrap_or_else(|| PathBuf::from("dependencies.yaml")),
            disable_cuda: override_bool("disable-cuda", env, settings)?
                .or(table.disable_cuda)
                .unwrap_or(false),
            require_cuda: override_bool("require-cuda", env, settings)?
                .or(table.require_cuda)
                .unwrap_or(false),
            matrix_entry: override_string("matrix-entry", env, settings)
                .or_else(|| table.matrix_entry.clone())
                .unwrap_or_default(),
            only_release_deps: override_bool("only-release-deps", env, settings)?
                .or(table.only_release_deps)
                .unwrap_or(false),
        })
    }
}

/// Conventional commit-file default: `<import package>/GIT_COMMIT`.
fn default_commit_file(pyproject: &Pyproject) -> PathBuf {
    PathBuf::from(pyproject.package_dir()).join("GIT_COMMIT")
}

/// Reject overrides of fixed options and unknown `GANTRY_*` variables.
fn validate_sources(env: &EnvSource, settings: &ConfigSettings) -> Result<(), ConfigError> {
    for var in env.keys() {
        let option = var
            .strip_prefix(ENV_PREFIX)
            .unwrap_or(var)
            .to_lowercase()
            .replace('_', "-");
        match option_spec(&option) {
            None => {
                return Err(ConfigError::UnknownEnvVar {
                    var: var.to_string(),
                })
            }
            Some(spec) if !spec.overridable => {
                return Err(ConfigError::NotOverridable {
                    option,
                    origin: "the environment",
                })
            }
            Some(_) => {}
        }
    }

    // Settings not naming a gantry option belong to the wrapped backend and
    // are forwarded, not rejected.
    for key in settings.keys() {
        if let Some(spec) = option_spec(key) {
            if !spec.overridable {
                return Err(ConfigError::NotOverridable {
                    option: key.clone(),
                    origin: "config settings",
                });
            }
        }
    }

    Ok(())
}

/// Highest-precedence override for a string option, if any.
fn override_string(option: &str, env: &EnvSource, settings: &ConfigSettings) -> Option<String> {
    if let Some(value) = settings.get(option) {
        return Some(value.clone());
    }
    env.get(&env_var_name(option)).map(str::to_owned)
}

/// Highest-precedence override for a boolean option, if any.
///
/// Only the exact strings `true` and `false` are accepted; alternative
/// spellings are errors, not falsy values.
fn override_bool(
    option: &str,
    env: &EnvSource,
    settings: &ConfigSettings,
) -> Result<Option<bool>, ConfigError> {
    match override_string(option, env, settings) {
        None => Ok(None),
        Some(value) => match value.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ConfigError::BadBool {
                option: option.to_string(),
                value,
            }),
        },
    }
}
