//! Adjacency-matrix construction, transitive closure and transitive reduction.
//!
//! Convention: `A[i, j] = 1` means node `i` is a direct causal successor of
//! node `j` (an edge `j -> i`). Consequently `A^m[i, j] > 0` iff there is a walk
//! of exactly `m` edges from `j` to `i`.
//!
//! Closure and reduction are boolean matrix iterations over the dense kernel.
//! Every loop is bounded; a closure that keeps changing past its bound is a
//! [`CausetError::NonConvergent`] failure, never a partial result.

use crate::config::ReductionConfig;
use crate::error::{CausetError, Result};
use crate::matrix::DenseMatrix;

/// Check that `a` is square with every entry exactly 0 or 1. Returns N.
pub fn validate_adjacency(a: &DenseMatrix) -> Result<usize> {
    let n = a.square_dim()?;
    for i in 0..n {
        for (j, &value) in a.row(i).iter().enumerate() {
            if value != 0.0 && value != 1.0 {
                return Err(CausetError::NonBinary {
                    row: i,
                    col: j,
                    value,
                });
            }
        }
    }
    Ok(n)
}

/// Build a causal-set adjacency matrix from raw separations and coordinates.
///
/// `A[i, j] = 1` iff `R[i, 0] > R[j, 0]` (i is later) and `S[i, j] < 0`
/// (timelike by sign convention). Column 0 of `coordinates` is time; further
/// columns are ignored.
pub fn causet_adj_matrix(
    separations: &DenseMatrix,
    coordinates: &DenseMatrix,
) -> Result<DenseMatrix> {
    let n = separations.square_dim()?;
    if coordinates.rows() != n {
        return Err(CausetError::ShapeMismatch {
            what: "coordinates",
            expected: format!("{n} rows"),
            found: format!("{} rows", coordinates.rows()),
        });
    }
    let mut a = DenseMatrix::zeros(n, n);
    if n == 0 {
        return Ok(a);
    }
    if coordinates.cols() == 0 {
        return Err(CausetError::EmptyCoordinates);
    }
    for i in 0..n {
        let t_i = coordinates.get(i, 0);
        for j in 0..n {
            if t_i > coordinates.get(j, 0) && separations.get(i, j) < 0.0 {
                a.set(i, j, 1.0);
            }
        }
    }
    Ok(a)
}

/// Transitive closure (reflexive-free) of an acyclic adjacency matrix.
///
/// Iterates `A <- saturate(A * A0 + A0)` to its fixed point. A DAG on N nodes
/// converges within N steps; the loop is capped at N + 1. A non-zero diagonal
/// in the converged closure is a directed cycle and is rejected.
pub fn transitive_completion(a: &DenseMatrix) -> Result<DenseMatrix> {
    let n = validate_adjacency(a)?;
    let closure = saturated_fixpoint(a, a, n + 1)?;
    if let Some(node) = (0..n).find(|&i| closure.get(i, i) != 0.0) {
        return Err(CausetError::CyclicInput { node });
    }
    Ok(closure)
}

/// Transitive reduction (Hasse diagram) of a transitively closed matrix.
///
/// Repeats `A <- clamp(A0 - A * A0)` for `max_path_len` iterations (default N).
///
/// Precondition: `a` is already transitively closed. On a non-closed input
/// the result is unspecified; use [`is_transitively_closed`] when unsure.
pub fn transitive_reduction(a: &DenseMatrix, config: &ReductionConfig) -> Result<DenseMatrix> {
    config.validate()?;
    let n = validate_adjacency(a)?;
    let iterations = config.max_path_len.unwrap_or(n);
    let mut reduced = a.clone();
    for _ in 0..iterations {
        let implied = reduced.matmul(a)?;
        reduced = a.zip_map(&implied, |edge, paths| {
            if edge - paths >= 1.0 { 1.0 } else { 0.0 }
        });
    }
    Ok(reduced)
}

/// Whether `a` already equals its own transitive closure.
pub fn is_transitively_closed(a: &DenseMatrix) -> Result<bool> {
    Ok(transitive_completion(a)? == *a)
}

/// Least fixed point of `X <- saturate(X * step + seed)` starting at `seed`.
///
/// With `seed = A^m` this is the 0/1 indicator of walks of length >= m.
pub(crate) fn saturated_fixpoint(
    seed: &DenseMatrix,
    step: &DenseMatrix,
    limit: usize,
) -> Result<DenseMatrix> {
    let mut current = seed.clone();
    for _ in 0..limit {
        let next = current
            .matmul(step)?
            .zip_map(seed, |walks, base| walks + base)
            .saturate();
        if next == current {
            return Ok(next);
        }
        current = next;
    }
    Err(CausetError::NonConvergent {
        iterations: limit,
        limit,
    })
}

/// Reachability by walks of one or more edges, via repeated squaring.
///
/// Iterates `R <- saturate(R + R * R)` from `a`; after `t` rounds `R` covers
/// every walk of up to `2^t` edges, so at most `ceil(log2 N) + 1` products
/// are needed. Returns the closure and the number of products performed.
pub(crate) fn squared_closure(a: &DenseMatrix) -> Result<(DenseMatrix, usize)> {
    let n = a.square_dim()?;
    let limit = (usize::BITS - n.leading_zeros()) as usize + 1;
    let mut current = a.clone();
    for round in 1..=limit {
        let next = current
            .matmul(&current)?
            .zip_map(&current, |longer, base| longer + base)
            .saturate();
        if next == current {
            return Ok((next, round));
        }
        current = next;
    }
    Err(CausetError::NonConvergent {
        iterations: limit,
        limit,
    })
}
