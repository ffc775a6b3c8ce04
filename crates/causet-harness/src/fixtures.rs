//! Fixture loading and management.

use std::path::{Path, PathBuf};

use causet_core::{
    DenseMatrix, LongestPathConfig, ReductionConfig, SeparationConfig, causet_adj_matrix,
};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Which stages to run and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Compute the transitive closure.
    pub close: bool,
    /// Compute the transitive reduction (implies `close`).
    pub reduce: bool,
    pub longest_path: LongestPathConfig,
    pub reduction: ReductionConfig,
    pub separation: SeparationConfig,
}

/// Reference outputs a run is checked against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedOutputs {
    pub closure: Option<DenseMatrix>,
    pub reduction: Option<DenseMatrix>,
    pub longest_paths: Option<DenseMatrix>,
    pub separations: Option<DenseMatrix>,
}

impl ExpectedOutputs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closure.is_none()
            && self.reduction.is_none()
            && self.longest_paths.is_none()
            && self.separations.is_none()
    }
}

/// A single causal-set fixture.
///
/// The graph comes either from `adjacency` directly or from the
/// `separations` + `coordinates` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixFixture {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacency: Option<DenseMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separations: Option<DenseMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<DenseMatrix>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default, skip_serializing_if = "ExpectedOutputs::is_empty")]
    pub expected: ExpectedOutputs,
}

impl MatrixFixture {
    /// Fixture over a given adjacency matrix with default pipeline settings.
    #[must_use]
    pub fn from_adjacency(name: impl Into<String>, adjacency: DenseMatrix) -> Self {
        Self {
            name: name.into(),
            adjacency: Some(adjacency),
            separations: None,
            coordinates: None,
            pipeline: PipelineConfig::default(),
            expected: ExpectedOutputs::default(),
        }
    }

    /// Load fixture from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize fixture to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load fixture from a file path.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Resolve the adjacency matrix this fixture describes.
    ///
    /// An explicit `adjacency` wins over `separations` + `coordinates`.
    pub fn adjacency_matrix(&self) -> Result<DenseMatrix, HarnessError> {
        if let Some(a) = &self.adjacency {
            return Ok(a.clone());
        }
        match (&self.separations, &self.coordinates) {
            (Some(s), Some(r)) => Ok(causet_adj_matrix(s, r)?),
            _ => Err(HarnessError::MissingInput {
                fixture: self.name.clone(),
            }),
        }
    }
}

/// Read a bare matrix (nested-rows JSON) from disk.
pub fn load_matrix(path: &Path) -> Result<DenseMatrix, HarnessError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Collect fixture files: `path` itself, or every `*.json` directly inside it
/// in sorted order.
pub fn fixture_paths(path: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();
    Ok(paths)
}
