//! Build matrix parsing.
//!
//! A matrix entry is a flat `axis=value;axis=value` string naming one cell
//! of the build matrix (e.g. `cuda=12;arch=amd64`). The empty string is a
//! valid entry selecting no axis overrides.

use std::collections::btree_map;
use std::collections::BTreeMap;

use thiserror::Error;

/// Error raised while parsing a matrix entry.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("matrix segment `{segment}` is missing `=` (expected `axis=value`)")]
    MissingSeparator { segment: String },
}

/// Axis-to-value mapping selecting one cell of the build matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMatrix {
    axes: BTreeMap<String, String>,
}

impl BuildMatrix {
    /// Parse a `axis=value;axis=value` entry.
    ///
    /// A repeated axis is not an error: the last occurrence wins, so matrix
    /// generation tooling can append overrides to an existing entry.
    pub fn parse(entry: &str) -> Result<Self, MatrixError> {
        let mut axes = BTreeMap::new();
        for segment in entry.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((axis, value)) => {
                    axes.insert(axis.trim().to_string(), value.trim().to_string());
                }
                None => {
                    return Err(MatrixError::MissingSeparator {
                        segment: segment.to_string(),
                    })
                }
            }
        }
        Ok(BuildMatrix { axes })
    }

    /// Value of one axis, if set.
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.axes.get(axis).map(String::as_str)
    }

    /// Set an axis value, replacing any previous value.
    pub fn set(&mut self, axis: impl Into<String>, value: impl Into<String>) {
        self.axes.insert(axis.into(), value.into());
    }

    pub fn contains(&self, axis: &str) -> bool {
        self.axes.contains_key(axis)
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Iterate axes in a stable order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.axes.iter()
    }

    /// Render as an `axis=value;axis=value` entry (stable order).
    pub fn entry(&self) -> String {
        self.axes
            .iter()
            .map(|(axis, value)| format!("{axis}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}
