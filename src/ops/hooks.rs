//! The standardized hook set.
//!
//! Every hook runs the same pipeline to the extent it needs: resolve
//! configuration, parse the build matrix, establish the CUDA context,
//! swap the rewritten manifest in, then delegate to the wrapped backend.
//! Requirement hooks additionally merge the resolved dependency sets with
//! the configured extras and the backend's own requirements; artifact
//! hooks stamp the commit files before delegating. Nothing is cached
//! across invocations — isolated build and install steps may run in
//! different environments.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::debug;

use crate::backend::{BuildBackend, CommandBackend, DistKind, Hook};
use crate::core::config::{ConfigSettings, EnvSource, ResolvedConfig};
use crate::core::cuda::{self, CudaContext, CudaProbe, NvccProbe, CUDA_AXIS};
use crate::core::manifest::{rewrite_manifest, Pyproject};
use crate::core::matrix::BuildMatrix;
use crate::core::requirement::{rewrite_all, WheelRegistry};
use crate::depfile::{self, KnownWheels, RequirementKind};
use crate::ops::edit::ManifestGuard;
use crate::ops::stamp;

/// Per-invocation inputs shared by every hook.
#[derive(Debug, Clone)]
pub struct HookOptions {
    /// Directory containing `pyproject.toml`.
    pub project_dir: PathBuf,
    /// Front-end config settings, gantry's and the backend's alike.
    pub settings: ConfigSettings,
}

impl HookOptions {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        HookOptions {
            project_dir: project_dir.into(),
            settings: ConfigSettings::new(),
        }
    }
}

/// Swappable collaborators for a hook invocation.
pub struct HookEnv<'a> {
    pub env: EnvSource,
    pub probe: &'a dyn CudaProbe,
    pub registry: &'a dyn WheelRegistry,
}

impl Default for HookEnv<'static> {
    fn default() -> Self {
        HookEnv {
            env: EnvSource::from_process(),
            probe: &NvccProbe,
            registry: &KnownWheels,
        }
    }
}

/// Everything the pipeline establishes before touching the backend.
struct Invocation {
    pyproject: Pyproject,
    config: ResolvedConfig,
    matrix: BuildMatrix,
    context: CudaContext,
}

/// Steps shared by every hook: configuration, matrix, CUDA context, and
/// the effective matrix the dependency resolver sees.
fn begin(opts: &HookOptions, env: &HookEnv) -> Result<Invocation> {
    let pyproject = Pyproject::load(&opts.project_dir)?;
    let config = ResolvedConfig::resolve(&pyproject, &env.env, &opts.settings)?;
    let mut matrix = BuildMatrix::parse(&config.matrix_entry)?;
    let context = cuda::detect(&config, &matrix, env.probe)?;

    // The declaration file selects on the cuda axis; when detection came
    // from the probe the entry will not have named it.
    if let CudaContext::Detected { major } = context {
        if !matrix.contains(CUDA_AXIS) {
            matrix.set(CUDA_AXIS, major.to_string());
        }
    }

    debug!(
        "established build context: cuda={:?}, matrix=`{}`",
        context,
        matrix.entry()
    );
    Ok(Invocation {
        pyproject,
        config,
        matrix,
        context,
    })
}

/// Resolve one requirement category from the declaration file, or `None`
/// when the project has no declaration file to consult.
fn resolve_category(
    project_dir: &Path,
    inv: &Invocation,
    kind: RequirementKind,
) -> Result<Option<Vec<String>>> {
    let path = project_dir.join(&inv.config.dependencies_file);
    if !path.exists() {
        debug!(
            "no dependency declarations at {}; skipping {kind} resolution",
            path.display()
        );
        return Ok(None);
    }
    let file = depfile::load(&path)?;
    Ok(Some(file.resolve(kind, &inv.matrix)?))
}

/// Swap in the manifest rewritten for this invocation's context.
fn apply_rewrite(
    project_dir: &Path,
    inv: &Invocation,
    registry: &dyn WheelRegistry,
) -> Result<ManifestGuard> {
    let run = resolve_category(project_dir, inv, RequirementKind::Run)?;
    let rewritten = rewrite_manifest(
        &inv.pyproject.contents,
        &inv.context,
        registry,
        inv.config.only_release_deps,
        run.as_deref(),
    )?;
    ManifestGuard::apply(project_dir, &rewritten)
}

/// First-seen-wins deduplication by exact string equality.
fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// `get-requires-for-build-*`.
pub fn get_requires(kind: DistKind, opts: &HookOptions) -> Result<Vec<String>> {
    get_requires_with(kind, opts, &HookEnv::default(), None)
}

/// `get-requires-for-build-*` with injected collaborators.
pub fn get_requires_with(
    kind: DistKind,
    opts: &HookOptions,
    env: &HookEnv,
    backend: Option<&dyn BuildBackend>,
) -> Result<Vec<String>> {
    let inv = begin(opts, env)?;
    let command_backend;
    let backend: &dyn BuildBackend = match backend {
        Some(backend) => backend,
        None => {
            command_backend =
                CommandBackend::new(&inv.config.build_backend, &opts.project_dir, &opts.settings);
            &command_backend
        }
    };

    let _guard = apply_rewrite(&opts.project_dir, &inv, env.registry)?;

    let mut requires = Vec::new();
    for category in [RequirementKind::Build, RequirementKind::Host] {
        if let Some(packages) = resolve_category(&opts.project_dir, &inv, category)? {
            requires.extend(packages);
        }
    }
    requires.extend(inv.config.requires.iter().cloned());

    let mut requires = rewrite_all(
        &requires,
        &inv.context,
        env.registry,
        inv.config.only_release_deps,
    )?;

    match backend.get_requires(kind)? {
        Some(extra) => requires.extend(extra),
        None => debug!(
            "wrapped backend `{}` does not provide {}; using gantry's list alone",
            backend.name(),
            Hook::requires_for(kind)
        ),
    }

    Ok(dedup_preserving_order(requires))
}

/// `prepare-metadata-for-build-*`.
pub fn prepare_metadata(
    kind: DistKind,
    metadata_dir: &Path,
    opts: &HookOptions,
) -> Result<String> {
    prepare_metadata_with(kind, metadata_dir, opts, &HookEnv::default(), None)
}

/// `prepare-metadata-for-build-*` with injected collaborators.
pub fn prepare_metadata_with(
    kind: DistKind,
    metadata_dir: &Path,
    opts: &HookOptions,
    env: &HookEnv,
    backend: Option<&dyn BuildBackend>,
) -> Result<String> {
    let inv = begin(opts, env)?;
    let command_backend;
    let backend: &dyn BuildBackend = match backend {
        Some(backend) => backend,
        None => {
            command_backend =
                CommandBackend::new(&inv.config.build_backend, &opts.project_dir, &opts.settings);
            &command_backend
        }
    };

    let _guard = apply_rewrite(&opts.project_dir, &inv, env.registry)?;

    match backend.prepare_metadata(kind, metadata_dir)? {
        Some(dist_info) => Ok(dist_info),
        None => bail!(
            "wrapped backend `{}` does not provide a metadata hook for {kind} builds",
            backend.name()
        ),
    }
}

/// `build-*`.
pub fn build(
    kind: DistKind,
    out_dir: &Path,
    metadata_dir: Option<&Path>,
    opts: &HookOptions,
) -> Result<String> {
    build_with(kind, out_dir, metadata_dir, opts, &HookEnv::default(), None)
}

/// `build-*` with injected collaborators.
pub fn build_with(
    kind: DistKind,
    out_dir: &Path,
    metadata_dir: Option<&Path>,
    opts: &HookOptions,
    env: &HookEnv,
    backend: Option<&dyn BuildBackend>,
) -> Result<String> {
    let inv = begin(opts, env)?;
    let command_backend;
    let backend: &dyn BuildBackend = match backend {
        Some(backend) => backend,
        None => {
            command_backend =
                CommandBackend::new(&inv.config.build_backend, &opts.project_dir, &opts.settings);
            &command_backend
        }
    };

    let _guard = apply_rewrite(&opts.project_dir, &inv, env.registry)?;
    stamp::stamp_commit_files(&opts.project_dir, &inv.config)?;

    match backend.build(kind, out_dir, metadata_dir)? {
        Some(artifact) => Ok(artifact),
        None => bail!(
            "wrapped backend `{}` does not provide {}",
            backend.name(),
            Hook::build_for(kind)
        ),
    }
}

/// `capabilities`: the hooks this project's backend stack supports.
pub fn capabilities(opts: &HookOptions) -> Result<Vec<Hook>> {
    capabilities_with(opts, &HookEnv::default(), None)
}

/// `capabilities` with injected collaborators.
pub fn capabilities_with(
    opts: &HookOptions,
    env: &HookEnv,
    backend: Option<&dyn BuildBackend>,
) -> Result<Vec<Hook>> {
    let pyproject = Pyproject::load(&opts.project_dir)?;
    let config = ResolvedConfig::resolve(&pyproject, &env.env, &opts.settings)?;
    let command_backend;
    let backend: &dyn BuildBackend = match backend {
        Some(backend) => backend,
        None => {
            command_backend =
                CommandBackend::new(&config.build_backend, &opts.project_dir, &opts.settings);
            &command_backend
        }
    };

    let provided = backend.capabilities()?;
    Ok(Hook::ALL
        .into_iter()
        .filter(|hook| Hook::ALWAYS.contains(hook) || provided.contains(hook))
        .collect())
}
