//! Test utilities and mocks for gantry unit tests.
//!
//! Only compiled for tests. Provides a mock wrapped backend, a scripted
//! CUDA probe, and project fixtures.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::{BackendError, BuildBackend, DistKind, Hook};
use crate::core::config::{ConfigSettings, EnvSource, GantryTable};
use crate::core::cuda::CudaProbe;
use crate::core::manifest::{Pyproject, PYPROJECT};

/// A scripted CUDA probe reporting a fixed toolkit version.
pub struct FixedCuda(pub Option<(u32, u32)>);

impl CudaProbe for FixedCuda {
    fn toolkit_version(&self) -> Option<(u32, u32)> {
        self.0
    }
}

/// An in-process wrapped backend for exercising the hook pipelines.
///
/// When given a project directory it snapshots `pyproject.toml` at
/// delegation time, so tests can assert on what the backend actually saw
/// while the manifest guard was active.
pub struct MockBackend {
    pub hooks: BTreeSet<Hook>,
    pub requires: Vec<String>,
    pub project_dir: Option<PathBuf>,
    pub seen_manifest: RefCell<Option<String>>,
    pub calls: RefCell<Vec<Hook>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend {
            hooks: Hook::ALL.into_iter().collect(),
            requires: Vec::new(),
            project_dir: None,
            seen_manifest: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl MockBackend {
    /// A backend providing every hook, snapshotting the manifest in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        MockBackend {
            project_dir: Some(dir.to_path_buf()),
            ..MockBackend::default()
        }
    }

    /// A backend providing only the given hooks.
    pub fn with_hooks(hooks: impl IntoIterator<Item = Hook>) -> Self {
        MockBackend {
            hooks: hooks.into_iter().collect(),
            ..MockBackend::default()
        }
    }

    /// A backend whose requirement hooks report `requires`.
    pub fn with_requires(requires: Vec<String>) -> Self {
        MockBackend {
            requires,
            ..MockBackend::default()
        }
    }

    fn record(&self, hook: Hook) {
        self.calls.borrow_mut().push(hook);
        if let Some(dir) = &self.project_dir {
            if let Ok(contents) = fs::read_to_string(dir.join(PYPROJECT)) {
                *self.seen_manifest.borrow_mut() = Some(contents);
            }
        }
    }
}

impl BuildBackend for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn capabilities(&self) -> Result<BTreeSet<Hook>, BackendError> {
        Ok(self.hooks.clone())
    }

    fn get_requires(&self, kind: DistKind) -> Result<Option<Vec<String>>, BackendError> {
        let hook = Hook::requires_for(kind);
        if !self.hooks.contains(&hook) {
            return Ok(None);
        }
        self.record(hook);
        Ok(Some(self.requires.clone()))
    }

    fn prepare_metadata(
        &self,
        kind: DistKind,
        _metadata_dir: &Path,
    ) -> Result<Option<String>, BackendError> {
        let Some(hook) = Hook::prepare_metadata_for(kind) else {
            return Ok(None);
        };
        if !self.hooks.contains(&hook) {
            return Ok(None);
        }
        self.record(hook);
        Ok(Some("demo-0.1.0.dist-info".to_string()))
    }

    fn build(
        &self,
        kind: DistKind,
        _out_dir: &Path,
        _metadata_dir: Option<&Path>,
    ) -> Result<Option<String>, BackendError> {
        let hook = Hook::build_for(kind);
        if !self.hooks.contains(&hook) {
            return Ok(None);
        }
        self.record(hook);
        Ok(Some(
            match kind {
                DistKind::Sdist => "demo-0.1.0.tar.gz",
                DistKind::Wheel => "demo-0.1.0-py3-none-any.whl",
                DistKind::Editable => "demo-0.1.0-editable.whl",
            }
            .to_string(),
        ))
    }
}

/// A `Pyproject` for the `demo` project with the given `[tool.gantry]`
/// table, without touching the filesystem.
pub fn pyproject_with_table(table: &str) -> Pyproject {
    Pyproject {
        path: PathBuf::from(PYPROJECT),
        contents: String::new(),
        name: "demo".to_string(),
        dependencies: Vec::new(),
        optional_dependencies: Default::default(),
        gantry: Some(toml::from_str::<GantryTable>(table).unwrap()),
    }
}

/// Write a `demo` project manifest with the given `[tool.gantry]` table.
pub fn write_project(dir: &Path, gantry_table: &str) {
    let manifest = format!(
        "[build-system]\n\
         requires = [\"gantry-build\"]\n\
         build-backend = \"gantry\"\n\
         \n\
         [project]\n\
         name = \"demo\"\n\
         version = \"0.1.0\"\n\
         dependencies = [\"numpy\", \"rmm>=24.0\"]\n\
         \n\
         [tool.gantry]\n\
         {gantry_table}"
    );
    fs::write(dir.join(PYPROJECT), manifest).unwrap();
}

/// Write a dependency-declaration file next to the project manifest.
pub fn write_depfile(dir: &Path, yaml: &str) {
    fs::write(dir.join("dependencies.yaml"), yaml).unwrap();
}

/// Environment snapshot from string pairs.
pub fn env_from(pairs: &[(&str, &str)]) -> EnvSource {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Config settings from string pairs.
pub fn settings_from(pairs: &[(&str, &str)]) -> ConfigSettings {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
