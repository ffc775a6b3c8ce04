//! # Spacelike separation estimators
//!
//! Turns a longest-path matrix `LP` into a symmetric signed squared-separation
//! matrix `DS2`:
//!
//! - timelike pairs (a path in either direction): `-(LP[i,j] + LP[j,i])^2`;
//! - spacelike pairs (no path either way): `+d^2` for an estimated spatial
//!   distance `d`;
//! - diagonal: 0.
//!
//! With `future(x) = { y : LP[y,x] > 0 }` and `past(x) = { y : LP[x,y] > 0 }`:
//!
//! **Naive** (exact boundary): `d` is the shortest longest-path bridge from
//! the common past to the common future of the pair, i.e.
//! `min LP[w,z]` over `w` in `future(i) & future(j)`, `z` in `past(i) & past(j)`.
//!
//! **Two-link** (Rideout & Wallden): take the shared links to the future
//! (`LP[w,i] == LP[w,j] == 1`) and to the past (`LP[i,z] == LP[j,z] == 1`).
//! For every future link `w` take the minimum `LP[w,z]` over the past links,
//! then average over `w`.
//!
//! Both estimators saturate to the ceiling `dmax` whenever the bounding
//! structure is missing, so every spacelike pair gets a finite distance.
//!
//! The outer loop over `i` is independent per row; with the `parallel`
//! feature the rows are evaluated on the rayon pool and written back
//! sequentially, so output is identical either way.

use serde::{Deserialize, Serialize};

use crate::config::{Estimator, SeparationConfig, check_ceiling};
use crate::error::{CausetError, Result};
use crate::matrix::DenseMatrix;

/// Signed squared separations plus bookkeeping about how they were filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacelikeSeparation {
    pub matrix: DenseMatrix,
    pub estimator: Estimator,
    /// Ceiling actually used.
    pub dmax: f64,
    pub landmarks: Option<usize>,
    /// Unordered causally related pairs.
    pub timelike_pairs: usize,
    /// Unordered spacelike pairs that received an estimate.
    pub spacelike_pairs: usize,
    /// Of those, pairs that fell back to `dmax`.
    pub saturated_pairs: usize,
    /// Spacelike pairs left unfilled by the landmark restriction.
    pub skipped_pairs: usize,
}

impl SpacelikeSeparation {
    /// Whether entry `(i, j)` holds a real value.
    ///
    /// Only a landmark-restricted run can leave entries uncomputed; those
    /// read as 0 in `matrix` and must not be taken as zero distance.
    #[must_use]
    pub fn is_computed(&self, i: usize, j: usize) -> bool {
        match self.landmarks {
            None => true,
            Some(k) => i == j || i.min(j) < k || self.matrix.get(i, j) != 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PairDistance {
    distance: f64,
    saturated: bool,
}

/// Check that `lp` is a square, finite, non-negative matrix. Returns N.
pub fn validate_longest_paths(lp: &DenseMatrix) -> Result<usize> {
    let n = lp.square_dim()?;
    for i in 0..n {
        for (j, &value) in lp.row(i).iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(CausetError::InvalidEntry {
                    row: i,
                    col: j,
                    value,
                });
            }
        }
    }
    Ok(n)
}

/// Compute the separation matrix with the configured estimator.
pub fn spacelike_matrix(
    lp: &DenseMatrix,
    config: &SeparationConfig,
) -> Result<SpacelikeSeparation> {
    config.validate()?;
    let n = validate_longest_paths(lp)?;
    let dmax = match config.dmax {
        Some(value) => value,
        None => lp.max_entry(),
    };
    if n >= 2 {
        check_ceiling(dmax)?;
    }

    let mut ds2 = timelike_squares(lp);
    let estimate: fn(&DenseMatrix, usize, usize, f64) -> PairDistance = match config.estimator {
        Estimator::Naive => naive_distance,
        Estimator::TwoLink => two_link_distance,
    };
    let column_bound = |i: usize| config.landmarks.map_or(i, |k| i.min(k));

    let row_fills = |i: usize| -> Vec<(usize, PairDistance)> {
        (0..column_bound(i))
            .filter(|&j| ds2.get(i, j) == 0.0)
            .map(|j| (j, estimate(lp, i, j, dmax)))
            .collect()
    };

    #[cfg(feature = "parallel")]
    let fills: Vec<Vec<(usize, PairDistance)>> = {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(row_fills).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let fills: Vec<Vec<(usize, PairDistance)>> = (0..n).map(row_fills).collect();

    let mut timelike_pairs = 0;
    let mut unordered_spacelike = 0;
    for i in 0..n {
        for j in 0..i {
            if ds2.get(i, j) == 0.0 {
                unordered_spacelike += 1;
            } else {
                timelike_pairs += 1;
            }
        }
    }

    let mut spacelike_pairs = 0;
    let mut saturated_pairs = 0;
    for (i, row) in fills.into_iter().enumerate() {
        for (j, pair) in row {
            let square = pair.distance * pair.distance;
            ds2.set(i, j, square);
            ds2.set(j, i, square);
            spacelike_pairs += 1;
            if pair.saturated {
                saturated_pairs += 1;
            }
        }
    }

    Ok(SpacelikeSeparation {
        matrix: ds2,
        estimator: config.estimator,
        dmax,
        landmarks: config.landmarks,
        timelike_pairs,
        spacelike_pairs,
        saturated_pairs,
        skipped_pairs: unordered_spacelike - spacelike_pairs,
    })
}

/// Naive estimator, optionally restricted to `landmarks` columns.
pub fn naive_spacelike_matrix(
    lp: &DenseMatrix,
    dmax: Option<f64>,
    landmarks: Option<usize>,
) -> Result<DenseMatrix> {
    let config = SeparationConfig {
        estimator: Estimator::Naive,
        dmax,
        landmarks,
    };
    spacelike_matrix(lp, &config).map(|sep| sep.matrix)
}

/// Two-link estimator.
pub fn twolink_spacelike_matrix(lp: &DenseMatrix, dmax: Option<f64>) -> Result<DenseMatrix> {
    let config = SeparationConfig {
        estimator: Estimator::TwoLink,
        dmax,
        landmarks: None,
    };
    spacelike_matrix(lp, &config).map(|sep| sep.matrix)
}

/// `-(LP + LP^T)^2` elementwise, with exact zeros kept positive.
fn timelike_squares(lp: &DenseMatrix) -> DenseMatrix {
    lp.zip_map(&lp.transpose(), |a, b| {
        let s = a + b;
        if s == 0.0 { 0.0 } else { -(s * s) }
    })
}

fn naive_distance(lp: &DenseMatrix, i: usize, j: usize, dmax: f64) -> PairDistance {
    let n = lp.rows();
    let common_future: Vec<usize> = lp
        .positive_in_col(i)
        .filter(|&x| lp.get(x, j) > 0.0)
        .collect();
    let common_past: Vec<usize> = (0..n)
        .filter(|&z| lp.get(i, z) > 0.0 && lp.get(j, z) > 0.0)
        .collect();

    let mut distance = dmax;
    let mut bridged = false;
    for &w in &common_future {
        for &z in &common_past {
            let w_z = lp.get(w, z);
            if w_z > 0.0 {
                distance = distance.min(w_z);
                bridged = true;
            }
        }
    }
    PairDistance {
        distance,
        saturated: !bridged,
    }
}

fn two_link_distance(lp: &DenseMatrix, i: usize, j: usize, dmax: f64) -> PairDistance {
    let n = lp.rows();
    let link_future: Vec<usize> = (0..n)
        .filter(|&x| lp.get(x, i) == 1.0 && lp.get(x, j) == 1.0)
        .collect();
    if link_future.is_empty() {
        return PairDistance {
            distance: dmax,
            saturated: true,
        };
    }
    let link_past: Vec<usize> = (0..n)
        .filter(|&z| lp.get(i, z) == 1.0 && lp.get(j, z) == 1.0)
        .collect();

    let mut total = 0.0;
    let mut bridged = false;
    for &w in &link_future {
        let mut nearest = dmax;
        for &z in &link_past {
            let w_z = lp.get(w, z);
            if w_z > 0.0 {
                nearest = nearest.min(w_z);
                bridged = true;
            }
        }
        total += nearest;
    }
    PairDistance {
        distance: total / link_future.len() as f64,
        saturated: !bridged,
    }
}
