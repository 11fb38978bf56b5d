//! `pyproject.toml` reading and format-preserving rewriting.
//!
//! The manifest is read once per hook invocation. Rewriting goes through
//! `toml_edit` so every byte the proxy does not own — comments, ordering,
//! whitespace, unrelated tables — survives the round trip.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use toml_edit::{value, Array, DocumentMut, Item};

use crate::core::config::GantryTable;
use crate::core::cuda::CudaContext;
use crate::core::requirement::{rewrite_all, rewrite_name, RequirementError, WheelRegistry};

/// Manifest file name, fixed by the packaging standard.
pub const PYPROJECT: &str = "pyproject.toml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to edit pyproject.toml")]
    Edit {
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("pyproject.toml has no `[project]` table")]
    NoProject,

    #[error("pyproject.toml has no `project.name`")]
    NoName,

    #[error(transparent)]
    Requirement(#[from] RequirementError),
}

#[derive(Debug, Deserialize)]
struct RawPyproject {
    project: RawProject,
    #[serde(default)]
    tool: RawTool,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    name: String,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default, rename = "optional-dependencies")]
    optional_dependencies: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTool {
    gantry: Option<GantryTable>,
}

/// Parsed view of the project manifest.
#[derive(Debug, Clone)]
pub struct Pyproject {
    pub path: PathBuf,
    /// Original file contents, kept for format-preserving rewrites.
    pub contents: String,
    pub name: String,
    pub dependencies: Vec<String>,
    pub optional_dependencies: BTreeMap<String, Vec<String>>,
    pub gantry: Option<GantryTable>,
}

impl Pyproject {
    /// Load `pyproject.toml` from the project directory.
    pub fn load(project_dir: &Path) -> Result<Self, ManifestError> {
        let path = project_dir.join(PYPROJECT);
        let contents = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        let raw: RawPyproject =
            toml::from_str(&contents).map_err(|source| ManifestError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(Pyproject {
            path,
            contents,
            name: raw.project.name,
            dependencies: raw.project.dependencies,
            optional_dependencies: raw.project.optional_dependencies,
            gantry: raw.tool.gantry,
        })
    }

    /// Conventional import-package directory for this project name.
    pub fn package_dir(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// Render a rewritten copy of the manifest for the active context: the
/// project name gains the CUDA suffix, `project.dependencies` is replaced
/// by `run_requirements` when the declaration file supplied one (and
/// rewritten in place otherwise), and each optional-dependency list is
/// rewritten in place. Untouched content is preserved byte-for-byte.
pub fn rewrite_manifest(
    contents: &str,
    context: &CudaContext,
    registry: &dyn WheelRegistry,
    only_release: bool,
    run_requirements: Option<&[String]>,
) -> Result<String, ManifestError> {
    let mut doc: DocumentMut = contents
        .parse()
        .map_err(|source| ManifestError::Edit { source })?;

    let project = doc
        .get_mut("project")
        .and_then(Item::as_table_mut)
        .ok_or(ManifestError::NoProject)?;

    let name = project
        .get("name")
        .and_then(|item| item.as_str())
        .ok_or(ManifestError::NoName)?
        .to_string();
    project["name"] = value(rewrite_name(&name, context));

    let dependencies = match run_requirements {
        Some(resolved) => Some(rewrite_all(resolved, context, registry, only_release)?),
        None => match project.get("dependencies") {
            Some(item) => {
                let existing = string_array(item);
                Some(rewrite_all(&existing, context, registry, only_release)?)
            }
            None => None,
        },
    };
    if let Some(dependencies) = dependencies {
        project["dependencies"] = value(requirement_array(&dependencies));
    }

    if let Some(optional) = project
        .get_mut("optional-dependencies")
        .and_then(Item::as_table_like_mut)
    {
        let mut rewritten = Vec::new();
        for (key, item) in optional.iter() {
            let existing = string_array(item);
            rewritten.push((
                key.to_string(),
                rewrite_all(&existing, context, registry, only_release)?,
            ));
        }
        for (key, list) in rewritten {
            optional.insert(&key, value(requirement_array(&list)));
        }
    }

    Ok(doc.to_string())
}

fn string_array(item: &Item) -> Vec<String> {
    item.as_array()
        .map(|array| {
            array
                .iter()
                .filter_map(|entry| entry.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn requirement_array(items: &[String]) -> Array {
    let mut array = Array::new();
    for item in items {
        array.push(item.as_str());
    }
    array
}
