//! Per-call configuration for the kernels.
//!
//! Nothing here is global: every operation takes its options explicitly, and
//! every struct deserializes with defaults so fixture files only need to name
//! the fields they change.

use serde::{Deserialize, Serialize};

use crate::error::{CausetError, Result};

/// Spatial-distance estimator used for spacelike pairs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estimator {
    /// Minimum longest path across the pair's common past/future boundary.
    #[default]
    Naive,
    /// Rideout-style averaged distance over shared links.
    TwoLink,
}

impl Estimator {
    /// Parse from string (case-insensitive). Unknown names yield `None`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "naive" | "exact" | "boundary" => Some(Self::Naive),
            "twolink" | "two-link" | "two_link" | "2link" | "2-link" | "rideout" => {
                Some(Self::TwoLink)
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::TwoLink => "twolink",
        }
    }
}

/// Options for [`crate::longest_path::longest_path_matrix`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongestPathConfig {
    /// Stop powering once paths of this length have been recorded.
    pub cutoff: Option<usize>,
}

impl LongestPathConfig {
    pub fn validate(&self) -> Result<()> {
        match self.cutoff {
            Some(0) => Err(CausetError::InvalidCutoff),
            _ => Ok(()),
        }
    }
}

/// Options for [`crate::adjacency::transitive_reduction`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    /// Iteration cap, usually the graph's longest path. Defaults to N.
    pub max_path_len: Option<usize>,
}

impl ReductionConfig {
    pub fn validate(&self) -> Result<()> {
        match self.max_path_len {
            Some(0) => Err(CausetError::InvalidIterationCap),
            _ => Ok(()),
        }
    }
}

/// Options for the spacelike separation engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    pub estimator: Estimator,
    /// Ceiling distance for pairs with no bounding structure. Defaults to max(LP).
    pub dmax: Option<f64>,
    /// Restrict the naive estimator to the first `k` columns.
    pub landmarks: Option<usize>,
}

impl SeparationConfig {
    #[must_use]
    pub fn naive() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn two_link() -> Self {
        Self {
            estimator: Estimator::TwoLink,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dmax(mut self, dmax: f64) -> Self {
        self.dmax = Some(dmax);
        self
    }

    #[must_use]
    pub fn with_landmarks(mut self, k: usize) -> Self {
        self.landmarks = Some(k);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.landmarks == Some(0) {
            return Err(CausetError::InvalidLandmarks);
        }
        if let Some(value) = self.dmax {
            check_ceiling(value)?;
        }
        Ok(())
    }
}

pub(crate) fn check_ceiling(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CausetError::DegenerateCeiling { value })
    }
}
