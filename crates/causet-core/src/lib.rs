//! Causal-set geometry on DAG adjacency matrices.
//!
//! This crate provides:
//! - Adjacency construction from raw separations, transitive closure and
//!   transitive reduction ([`adjacency`]).
//! - All-pairs longest paths by bounded matrix powering ([`longest_path`]).
//! - Signed squared separations with the naive and two-link spacelike
//!   distance estimators, including landmark-restricted runs ([`separation`]).
//!
//! Everything is a pure function of its matrix inputs. Inputs are never
//! mutated and every call allocates its own output.

#![forbid(unsafe_code)]

pub mod adjacency;
pub mod config;
pub mod error;
pub mod longest_path;
pub mod matrix;
pub mod separation;

pub use adjacency::{
    causet_adj_matrix, is_transitively_closed, transitive_completion, transitive_reduction,
    validate_adjacency,
};
pub use config::{Estimator, LongestPathConfig, ReductionConfig, SeparationConfig};
pub use error::{CausetError, Result};
pub use longest_path::{
    LongestPathEngine, LongestPathOutcome, PowerState, longest_path_matrix, longest_paths,
};
pub use matrix::DenseMatrix;
pub use separation::{
    SpacelikeSeparation, naive_spacelike_matrix, spacelike_matrix, twolink_spacelike_matrix,
    validate_longest_paths,
};
