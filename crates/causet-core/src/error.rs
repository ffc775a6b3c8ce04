//! Error taxonomy for the causal-set kernels.
//!
//! Every public operation validates its inputs at the boundary and reports
//! contract violations here. Empty boundary sets in the separation estimators
//! are not errors; they saturate to the ceiling distance instead.

use thiserror::Error;

/// Errors produced by the matrix kernels.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CausetError {
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        found: String,
    },
    #[error("coordinate matrix has no time column")]
    EmptyCoordinates,
    #[error("adjacency entry ({row}, {col}) = {value} is not 0 or 1")]
    NonBinary { row: usize, col: usize, value: f64 },
    #[error("longest-path entry ({row}, {col}) = {value} is negative or not finite")]
    InvalidEntry { row: usize, col: usize, value: f64 },
    #[error("iteration did not reach a fixed point within {limit} steps (ran {iterations})")]
    NonConvergent { iterations: usize, limit: usize },
    #[error("input graph contains a directed cycle through node {node}")]
    CyclicInput { node: usize },
    #[error("longest-path cutoff must be at least 1")]
    InvalidCutoff,
    #[error("reduction iteration cap must be at least 1")]
    InvalidIterationCap,
    #[error("landmark count must be at least 1")]
    InvalidLandmarks,
    #[error("spacelike ceiling {value} must be finite and strictly positive")]
    DegenerateCeiling { value: f64 },
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, CausetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_entry() {
        let err = CausetError::NonBinary {
            row: 2,
            col: 3,
            value: 0.5,
        };
        assert_eq!(err.to_string(), "adjacency entry (2, 3) = 0.5 is not 0 or 1");
    }

    #[test]
    fn non_convergence_is_distinct_from_cycles() {
        let a = CausetError::NonConvergent {
            iterations: 5,
            limit: 5,
        };
        let b = CausetError::CyclicInput { node: 0 };
        assert_ne!(a, b);
        assert!(a.to_string().contains("fixed point"));
    }
}
